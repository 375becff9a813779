pub mod task_lock;
