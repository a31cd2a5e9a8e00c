pub mod format_description_event;
pub mod gtid_event;
pub mod mariadb_gtid_event;
pub mod previous_gtids_event;
pub mod query_event;
pub mod rotate_event;
pub mod rows_event;
pub mod table_map_event;
pub mod xid_event;
