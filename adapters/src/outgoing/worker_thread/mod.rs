pub mod thread_launcher;
