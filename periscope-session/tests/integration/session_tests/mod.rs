mod test_join_retry;
mod test_stop_session;
