use async_trait::async_trait;
use domain::{AddressMap, AddressSpec, DeviceFamily, FieldAddresses, FieldValue, RawField, ReadPrimitive};
use gw_poller::DevicePoller;
use gw_protocol::{DeviceSession, LivenessProbe, ProtocolAdapter, ProtocolError};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    reads: AtomicUsize,
    closes: AtomicUsize,
}

/// 每次打开会话后寄存器值加一，用来观察缓存是否生效。
struct FakeAdapter {
    counters: Arc<Counters>,
    next_value: AtomicU16,
    fail_reads: bool,
    refuse_open: bool,
    panic_on: Option<&'static str>,
    delay: Duration,
}

impl FakeAdapter {
    fn new(counters: Arc<Counters>) -> Self {
        Self {
            counters,
            next_value: AtomicU16::new(1),
            fail_reads: false,
            refuse_open: false,
            panic_on: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl ProtocolAdapter for FakeAdapter {
    async fn open(&self, ip: &str) -> Result<Box<dyn DeviceSession>, ProtocolError> {
        if self.panic_on == Some(ip) {
            panic!("adapter crashed for {ip}");
        }
        if self.refuse_open {
            return Err(ProtocolError::Connection("refused".to_string()));
        }
        tokio::time::sleep(self.delay).await;
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            counters: self.counters.clone(),
            value: self.next_value.fetch_add(1, Ordering::SeqCst),
            fail_reads: self.fail_reads,
        }))
    }
}

struct FakeSession {
    counters: Arc<Counters>,
    value: u16,
    fail_reads: bool,
}

#[async_trait]
impl DeviceSession for FakeSession {
    async fn read(
        &mut self,
        primitive: ReadPrimitive,
        spec: &AddressSpec,
    ) -> Result<RawField, ProtocolError> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(ProtocolError::Modbus("exception: IllegalDataAddress".to_string()));
        }
        let count = spec.count().unwrap_or(1) as usize;
        match primitive {
            ReadPrimitive::Coils | ReadPrimitive::DiscreteInputs => {
                Ok(RawField::Bits(vec![true; count]))
            }
            _ => Ok(RawField::Registers(vec![self.value; count])),
        }
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedProbe {
    unreachable: HashSet<&'static str>,
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(&self, ip: &str) -> bool {
        !self.unreachable.contains(ip)
    }
}

fn probe(unreachable: &[&'static str]) -> Arc<ScriptedProbe> {
    Arc::new(ScriptedProbe {
        unreachable: unreachable.iter().copied().collect(),
    })
}

fn fields(entries: &[(&str, &[u16])]) -> FieldAddresses {
    entries
        .iter()
        .map(|(tag, params)| (tag.to_string(), AddressSpec::new(params.to_vec()).expect("spec")))
        .collect()
}

fn modbus_map(ips: &[&str]) -> Arc<AddressMap> {
    let mut map = AddressMap::new(DeviceFamily::ModbusTcp);
    for ip in ips {
        map.insert_device(
            *ip,
            fields(&[
                ("ReadHoldingRegisters", &[0, 2]),
                ("ReadCoils", &[10, 3]),
                ("Unknown", &[0, 1]),
            ]),
        );
    }
    Arc::new(map)
}

#[tokio::test]
async fn get_one_decodes_known_tags_in_order() {
    let counters = Arc::new(Counters::default());
    let poller = DevicePoller::new(
        modbus_map(&["10.0.0.1"]),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&[]),
    );

    let record = poller.get_one("10.0.0.1").await;
    let data = record.data.expect("data");
    let tags: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(tags, vec!["ReadHoldingRegisters", "ReadCoils"]);
    assert_eq!(data["ReadHoldingRegisters"], FieldValue::Int16List(vec![1, 1]));
    assert_eq!(data["ReadCoils"], FieldValue::BoolList(vec![true; 3]));
    assert_eq!(counters.reads.load(Ordering::SeqCst), 2);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_get_one_returns_cached_snapshot() {
    let counters = Arc::new(Counters::default());
    let poller = DevicePoller::new(
        modbus_map(&["10.0.0.1"]),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&[]),
    );

    let first = poller.get_one("10.0.0.1").await;
    let second = poller.get_one("10.0.0.1").await;
    assert_eq!(first, second);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_get_one_acquires_once() {
    let counters = Arc::new(Counters::default());
    let mut adapter = FakeAdapter::new(counters.clone());
    adapter.delay = Duration::from_millis(20);
    let poller = Arc::new(DevicePoller::new(
        modbus_map(&["10.0.0.1"]),
        Arc::new(adapter),
        probe(&[]),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let poller = poller.clone();
        handles.push(tokio::spawn(async move { poller.get_one("10.0.0.1").await }));
    }
    let mut records = Vec::new();
    for handle in handles {
        records.push(handle.await.expect("join"));
    }

    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    assert!(records.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn unconfigured_ip_is_not_cached_and_not_polled() {
    let counters = Arc::new(Counters::default());
    let poller = DevicePoller::new(
        modbus_map(&["10.0.0.1"]),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&[]),
    );

    let record = poller.get_one("10.9.9.9").await;
    assert_eq!(record.ip, "10.9.9.9");
    assert!(record.data.is_none());
    assert!(poller.cache().is_empty());
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_device_skips_session() {
    let counters = Arc::new(Counters::default());
    let poller = DevicePoller::new(
        modbus_map(&["10.0.0.1"]),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&["10.0.0.1"]),
    );

    let record = poller.get_one("10.0.0.1").await;
    assert!(record.data.is_none());
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
    assert_eq!(poller.cache().get("10.0.0.1"), Some(record));
}

#[tokio::test]
async fn read_failure_closes_session_and_nulls_data() {
    let counters = Arc::new(Counters::default());
    let mut adapter = FakeAdapter::new(counters.clone());
    adapter.fail_reads = true;
    let poller = DevicePoller::new(modbus_map(&["10.0.0.1"]), Arc::new(adapter), probe(&[]));

    let record = poller.get_one("10.0.0.1").await;
    assert!(record.data.is_none());
    assert_eq!(counters.reads.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn decode_failure_closes_session_and_nulls_data() {
    let counters = Arc::new(Counters::default());
    let mut map = AddressMap::new(DeviceFamily::XinJie);
    // 3 个寄存器无法成对重组为 f32
    map.insert_device("10.0.0.4", fields(&[("INT", &[0, 1]), ("REAL", &[100, 3])]));
    let poller = DevicePoller::new(
        Arc::new(map),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&[]),
    );

    let record = poller.get_one("10.0.0.4").await;
    assert!(record.data.is_none());
    assert_eq!(counters.reads.load(Ordering::SeqCst), 2);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn open_failure_nulls_data() {
    let counters = Arc::new(Counters::default());
    let mut adapter = FakeAdapter::new(counters.clone());
    adapter.refuse_open = true;
    let poller = DevicePoller::new(modbus_map(&["10.0.0.1"]), Arc::new(adapter), probe(&[]));

    assert!(poller.get_one("10.0.0.1").await.data.is_none());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_all_isolates_unreachable_devices() {
    let counters = Arc::new(Counters::default());
    let poller = Arc::new(DevicePoller::new(
        modbus_map(&["10.0.0.1", "10.0.0.2"]),
        Arc::new(FakeAdapter::new(counters.clone())),
        probe(&["10.0.0.1"]),
    ));

    let records = poller.get_all().await;
    assert_eq!(records.len(), 2);
    let a = records.iter().find(|r| r.ip == "10.0.0.1").expect("a");
    let b = records.iter().find(|r| r.ip == "10.0.0.2").expect("b");
    assert!(a.data.is_none());
    assert!(b.data.is_some());
}

#[tokio::test]
async fn get_all_falls_back_to_null_records_when_a_task_fails() {
    let counters = Arc::new(Counters::default());
    let mut adapter = FakeAdapter::new(counters.clone());
    adapter.panic_on = Some("10.0.0.2");
    let ips = ["10.0.0.1", "10.0.0.2", "10.0.0.3"];
    let poller = Arc::new(DevicePoller::new(modbus_map(&ips), Arc::new(adapter), probe(&[])));

    let records = poller.get_all().await;
    assert_eq!(records.len(), ips.len());
    assert!(records.iter().all(|r| r.data.is_none()));
    let returned: Vec<&str> = records.iter().map(|r| r.ip.as_str()).collect();
    assert_eq!(returned, ips);
}

#[tokio::test]
async fn get_all_on_empty_family_is_empty() {
    let counters = Arc::new(Counters::default());
    let poller = Arc::new(DevicePoller::new(
        Arc::new(AddressMap::new(DeviceFamily::Fairino)),
        Arc::new(FakeAdapter::new(counters)),
        probe(&[]),
    ));
    assert!(poller.get_all().await.is_empty());
    assert_eq!(poller.family(), DeviceFamily::Fairino);
}

#[tokio::test]
async fn cancelled_get_all_lets_device_tasks_finish() {
    let counters = Arc::new(Counters::default());
    let mut adapter = FakeAdapter::new(counters.clone());
    adapter.delay = Duration::from_millis(100);
    let poller = Arc::new(DevicePoller::new(
        modbus_map(&["10.0.0.1", "10.0.0.2"]),
        Arc::new(adapter),
        probe(&[]),
    ));

    let caller = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.get_all().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    caller.abort();
    assert!(caller.await.expect_err("aborted").is_cancelled());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(counters.opens.load(Ordering::SeqCst), 2);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 2);
    assert_eq!(poller.cache().len(), 2);
    assert!(poller.cache().get("10.0.0.2").expect("cached").data.is_some());
}
