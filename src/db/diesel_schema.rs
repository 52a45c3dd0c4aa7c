diesel::table! {
    projects (id) {
        id -> Text,
        title -> Text,
        one_line_description -> Nullable<Text>,
        description -> Nullable<Text>,
        project_type -> Nullable<Text>,
        domain -> Nullable<Text>,
        owner_id -> Text,
        status -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    project_roles (project_id, role_name) {
        project_id -> Text,
        role_name -> Text,
        required_count -> Integer,
        filled_count -> Integer,
    }
}

diesel::table! {
    project_members (project_id, user_id) {
        project_id -> Text,
        user_id -> Text,
        role_name -> Text,
        joined_at -> Text,
    }
}

diesel::table! {
    project_applications (id) {
        id -> Text,
        project_id -> Text,
        applicant_id -> Text,
        preferred_roles_json -> Text,
        message -> Nullable<Text>,
        status -> Text,
        final_role -> Nullable<Text>,
        applied_at -> Text,
    }
}

diesel::table! {
    invitations (id) {
        id -> Text,
        from_user_id -> Text,
        to_user_id -> Text,
        project_id -> Text,
        roles_json -> Text,
        message -> Nullable<Text>,
        status -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    friend_requests (id) {
        id -> Text,
        from_user_id -> Text,
        to_user_id -> Text,
        message -> Nullable<Text>,
        status -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    friendships (id) {
        id -> Text,
        user_a_id -> Text,
        user_b_id -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    notifications (id) {
        id -> Text,
        recipient_id -> Text,
        notif_type -> Text,
        title -> Text,
        message -> Text,
        link -> Nullable<Text>,
        related_kind -> Nullable<Text>,
        related_id -> Nullable<Text>,
        is_read -> Integer,
        timestamp -> Text,
    }
}

diesel::table! {
    profiles (user_id) {
        user_id -> Text,
        display_name -> Nullable<Text>,
        college -> Nullable<Text>,
        major -> Nullable<Text>,
        bio -> Nullable<Text>,
        primary_role -> Nullable<Text>,
        other_roles_json -> Text,
        skills_json -> Text,
        interest_domains_json -> Text,
        links_json -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    projects,
    project_roles,
    project_members,
    project_applications,
    invitations,
    friend_requests,
    friendships,
    notifications,
    profiles,
);
