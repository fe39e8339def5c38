//! Standard simulation events.

// MIGRATION EVENTS ////////////////////////////////////////////////////////////////////////////////

pub mod migration {
    use serde::Serialize;

    /// Asks the coordinator to plan and dispatch the migration of a whole VM group.
    #[derive(Serialize)]
    pub struct GangMigrationRequest {
        pub group_id: u32,
    }

    /// Deferred completion callback for one dispatched sub-batch.
    #[derive(Serialize)]
    pub struct BatchMigrationCompleted {
        pub batch_id: u64,
    }

    /// Resubmits the paused workload of a non-live migrated VM.
    #[derive(Serialize)]
    pub struct ResumeWorkload {
        pub vm_id: u32,
    }
}
