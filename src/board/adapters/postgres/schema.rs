//! Diesel schema for sprint board persistence.

diesel::table! {
    /// Projects owning sprints and issues.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Short project key.
        #[max_length = 16]
        key -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Owning organization.
        #[max_length = 255]
        organization_id -> Varchar,
        /// Project administrators.
        admin_ids -> Array<Text>,
    }
}

diesel::table! {
    /// Sprint records and their lifecycle state.
    sprints (id) {
        /// Sprint identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Start of the sprint window.
        start_date -> Timestamptz,
        /// End of the sprint window.
        end_date -> Timestamptz,
        /// Lifecycle state.
        #[max_length = 20]
        status -> Varchar,
        /// Owning project.
        project_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issues placed on sprint boards.
    issues (id) {
        /// Issue identifier.
        id -> Uuid,
        /// Issue title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional long-form description.
        description -> Nullable<Text>,
        /// Board column.
        #[max_length = 20]
        status -> Varchar,
        /// Priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Zero-based position within the column.
        rank -> Int4,
        /// Optimistic concurrency counter.
        version -> Int8,
        /// Sprint the issue is scheduled in.
        sprint_id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Optional assignee.
        #[max_length = 255]
        assignee -> Nullable<Varchar>,
        /// Reporter.
        #[max_length = 255]
        reporter -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(sprints -> projects (project_id));
diesel::joinable!(issues -> sprints (sprint_id));

diesel::allow_tables_to_appear_in_same_query!(issues, projects, sprints);
