mod concurrency_test;
mod mode_toggle_test;
