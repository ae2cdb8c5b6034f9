//! Integration tests for the Argo CD bridge

mod test_cache;
mod test_fsm;
mod test_handlers;
mod test_sync_runner;
