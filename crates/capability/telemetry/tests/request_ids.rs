use gw_telemetry::{metrics, new_request_ids, record_cache_hit, record_poll_latency_ms};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot();
    record_cache_hit();
    record_poll_latency_ms(40);
    let after = metrics().snapshot();
    assert!(after.cache_hits >= before.cache_hits + 1);
    assert!(after.poll_latency_ms_total >= before.poll_latency_ms_total + 40);
    assert!(after.poll_latency_ms_count >= before.poll_latency_ms_count + 1);
}
