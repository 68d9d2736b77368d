pub mod app;
pub mod stop_times;
