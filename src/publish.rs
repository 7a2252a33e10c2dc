use crate::error::Result;
use crate::structs::BuildingRecord;
use kafka::client::KafkaClient;
use kafka::producer::{Producer, Record, RequiredAcks};
use log::{debug, error, info, warn};

/// Destination for serialized records.
pub trait MessageSink {
    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Blocks until every message handed to `send` is acknowledged.
    fn flush(&mut self) -> Result<()>;
}

/// Kafka producer connected to a single broker.
pub struct KafkaSink {
    producer: Producer,
}

impl KafkaSink {
    /// Opens the connection to `broker` and loads metadata for `topic`.
    ///
    /// Requesting metadata for a named topic lets a broker with topic
    /// auto-creation enabled create it before the first send.
    ///
    /// # Errors
    /// Returns `PipelineError::Publish` if the broker cannot be reached.
    pub fn connect(broker: &str, topic: &str) -> Result<Self> {
        let mut client = KafkaClient::new(vec![broker.to_owned()]);
        client.load_metadata(&[topic])?;
        let producer = Producer::from_client(client)
            .with_required_acks(RequiredAcks::One)
            .create()?;
        Ok(Self { producer })
    }
}

impl MessageSink for KafkaSink {
    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.producer.send(&Record::from_value(topic, payload))?;
        Ok(())
    }

    // `send` already waits for the broker acknowledgement.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Serializes a record as one UTF-8 JSON object. Non-finite heights are
/// written as `null`; keys are never omitted.
pub fn encode_record(record: &BuildingRecord) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Sends every record as its own message to `topic` and flushes the sink.
///
/// Stops at the first failure; messages already sent stay sent.
///
/// # Arguments
/// * `sink` - Connected message sink
/// * `records` - Records in output order
/// * `topic` - Destination topic
///
/// # Returns
/// Returns the number of messages sent.
///
/// # Errors
/// Returns the first serialization, send or flush error.
pub fn publish_with<S: MessageSink>(
    sink: &mut S,
    records: &[BuildingRecord],
    topic: &str,
) -> Result<usize> {
    let mut sent = 0;
    for record in records {
        let payload = encode_record(record)?;
        sink.send(topic, &payload)?;
        sent += 1;
        debug!("Sent record {} ({}/{})", record.rank, sent, records.len());
    }
    sink.flush()?;
    Ok(sent)
}

/// Publishes records to `topic` on the Kafka broker at `broker`.
///
/// Does nothing but warn when `records` is empty. Connection and send
/// failures are logged together with the broker address and do not
/// propagate; the return value is the number of messages delivered.
pub fn publish(records: &[BuildingRecord], topic: &str, broker: &str) -> usize {
    if records.is_empty() {
        warn!("No records to publish, skipping Kafka");
        return 0;
    }

    info!(
        "Sending {} messages to topic '{}' on {}",
        records.len(),
        topic,
        broker
    );
    let result = KafkaSink::connect(broker, topic)
        .and_then(|mut sink| publish_with(&mut sink, records, topic));
    match result {
        Ok(sent) => {
            info!("Sent {} messages to Kafka", sent);
            sent
        }
        Err(e) => {
            error!("Kafka publish failed: {}", e);
            error!("Check that the Kafka broker is running and reachable at {}", broker);
            0
        }
    }
}
