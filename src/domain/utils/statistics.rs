use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::error::Result;

/// Each event is a set of key-value-pairs describing one admission decision.
/// This enum specifies all allowed keys and thus the columns of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatParameter {
    /// Seconds since the collector was started.
    Time,

    /// Submit, Update or Delete.
    Operation,

    /// Committed, Rejected, Invalid, Failed or Deleted.
    Outcome,

    /// Id of the committed, updated or deleted session.
    SessionId,

    AcademicYear,

    Semester,

    RoomConflicts,

    DuplicateConflicts,

    /// Number of instructor findings (up to four kinds per request).
    InstructorConflicts,

    /// Time to reach the decision in microseconds.
    ProcessingTimeUs,
}

impl StatParameter {
    /// Column order of the CSV output.
    pub const ALL: [StatParameter; 10] = [
        StatParameter::Time,
        StatParameter::Operation,
        StatParameter::Outcome,
        StatParameter::SessionId,
        StatParameter::AcademicYear,
        StatParameter::Semester,
        StatParameter::RoomConflicts,
        StatParameter::DuplicateConflicts,
        StatParameter::InstructorConflicts,
        StatParameter::ProcessingTimeUs,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            StatParameter::Time => "Time",
            StatParameter::Operation => "Operation",
            StatParameter::Outcome => "Outcome",
            StatParameter::SessionId => "SessionId",
            StatParameter::AcademicYear => "AcademicYear",
            StatParameter::Semester => "Semester",
            StatParameter::RoomConflicts => "RoomConflicts",
            StatParameter::DuplicateConflicts => "DuplicateConflicts",
            StatParameter::InstructorConflicts => "InstructorConflicts",
            StatParameter::ProcessingTimeUs => "ProcessingTimeUs",
        }
    }
}

/// Values are kept in their native format and only formatted when written.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Integer(i64),
    Text(String),
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        StatValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }

    fn to_row(&self) -> Vec<String> {
        StatParameter::ALL
            .iter()
            .map(|param| match self.data.get(param) {
                Some(StatValue::Integer(i)) => i.to_string(),
                Some(StatValue::Text(t)) => t.clone(),
                None => "NA".to_string(),
            })
            .collect()
    }
}

/// Messages sent from the admitting threads to the writer thread.
enum StatsMessage {
    Log(StatisticEvent),
    Flush(mpsc::Sender<bool>),
    Shutdown,
}

/// Writes admission statistics as `;` separated CSV on a background thread.
///
/// Dropping the collector flushes and joins the writer.
#[derive(Debug)]
pub struct StatsCollector {
    sender: mpsc::Sender<StatsMessage>,
    start_time: Instant,
    worker: Option<JoinHandle<()>>,
}

impl StatsCollector {
    pub fn to_file(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        log::info!("Writing admission statistics to '{}'.", path.display());
        Ok(Self::to_writer(Box::new(BufWriter::new(file))))
    }

    pub fn to_stdout() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || Self::worker_loop(rx, writer));

        StatsCollector { sender: tx, start_time: Instant::now(), worker: Some(worker) }
    }

    fn worker_loop(rx: mpsc::Receiver<StatsMessage>, writer: Box<dyn Write + Send>) {
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        let headers: Vec<&str> = StatParameter::ALL.iter().map(StatParameter::header).collect();
        if let Err(e) = csv_wtr.write_record(&headers) {
            log::error!("Stats Error: Failed to write headers: {}", e);
        }

        for msg in rx {
            match msg {
                StatsMessage::Log(event) => {
                    if let Err(e) = csv_wtr.write_record(event.to_row()) {
                        log::error!("Stats Error: Failed to write record: {}", e);
                    }
                }
                StatsMessage::Flush(ack) => {
                    let flushed = match csv_wtr.flush() {
                        Ok(()) => true,
                        Err(e) => {
                            log::error!("Stats Error: Failed to flush statistics: {}", e);
                            false
                        }
                    };
                    if ack.send(flushed).is_err() {
                        log::debug!("Statistics flush finished after its caller left.");
                    }
                }
                StatsMessage::Shutdown => break,
            }
        }

        if let Err(e) = csv_wtr.flush() {
            log::error!("Stats Error: Failed to flush statistics: {}", e);
        }
    }

    /// Queues an event. Never blocks the caller.
    pub fn add_event(&self, mut event: StatisticEvent) {
        if event.get(StatParameter::Time).is_none() {
            let elapsed = i64::try_from(self.start_time.elapsed().as_secs()).unwrap_or(i64::MAX);
            event.set(StatParameter::Time, elapsed);
        }

        // Statistics never fail an admission.
        if self.sender.send(StatsMessage::Log(event)).is_err() {
            log::warn!("Statistics writer is gone, event dropped.");
        }
    }

    /// Waits until every queued row has reached the writer. Returns `false` if flushing failed
    /// or the writer thread is gone.
    pub fn flush(&self) -> bool {
        let (ack, done) = mpsc::channel();
        if self.sender.send(StatsMessage::Flush(ack)).is_err() {
            log::warn!("Statistics writer is gone, flush skipped.");
            return false;
        }

        done.recv().unwrap_or(false)
    }
}

impl Drop for StatsCollector {
    fn drop(&mut self) {
        let _ = self.sender.send(StatsMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Statistics writer thread panicked.");
            }
        }
    }
}
