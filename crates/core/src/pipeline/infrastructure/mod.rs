pub mod threaded_session_worker;
