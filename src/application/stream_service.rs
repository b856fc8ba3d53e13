// Streaming service - synthetic push channel, one frame per tick
use crate::domain::frame::{Field, FieldValues, Frame, FRAME_NAME, TIME_FIELD};
use chrono::{DateTime, FixedOffset, Local};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const STREAM_PATH: &str = "stream";
pub const STREAM_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Ok,
    PermissionDenied,
}

#[derive(Clone, Default)]
pub struct StreamService;

impl StreamService {
    pub fn new() -> Self {
        Self
    }

    /// Only the `stream` path may be subscribed to
    pub fn subscribe(&self, path: &str) -> StreamStatus {
        if path == STREAM_PATH {
            StreamStatus::Ok
        } else {
            StreamStatus::PermissionDenied
        }
    }

    /// Publishing is never allowed
    pub fn publish(&self, path: &str) -> StreamStatus {
        tracing::debug!(path, "publish refused");
        StreamStatus::PermissionDenied
    }

    /// Emits every `period` until `cancel` fires or the receiver is dropped
    pub fn run_stream(
        &self,
        path: &str,
        period: Duration,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(16);
        let path = path.to_string();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            let mut counter: u64 = 0;
            // single-row buffer, overwritten every tick
            let mut frame = Frame::new(
                FRAME_NAME,
                vec![
                    Field::time(TIME_FIELD, vec![Local::now().fixed_offset()]),
                    Field::number("values", vec![None]),
                ],
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        set_row(&mut frame, Local::now().fixed_offset(), 10.0 * (counter % 2 + 1) as f64);
                        counter += 1;

                        if tx.send(frame.clone()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::info!(path = %path, sent = counter, "finished streaming");
        });

        rx
    }
}

fn set_row(frame: &mut Frame, ts: DateTime<FixedOffset>, value: f64) {
    for field in frame.fields.iter_mut() {
        match &mut field.values {
            FieldValues::Time(times) => times[0] = ts,
            FieldValues::Number(values) => values[0] = Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_stream_path_is_subscribable() {
        let service = StreamService::new();
        assert_eq!(service.subscribe("stream"), StreamStatus::Ok);
        assert_eq!(service.subscribe("other"), StreamStatus::PermissionDenied);
        assert_eq!(service.publish("stream"), StreamStatus::PermissionDenied);
    }

    #[tokio::test]
    async fn test_stream_alternates_values() {
        let service = StreamService::new();
        let cancel = CancellationToken::new();
        let mut rx = service.run_stream("stream", Duration::from_millis(5), cancel.clone());

        let mut seen = Vec::new();
        for _ in 0..3 {
            let frame = rx.recv().await.unwrap();
            assert_eq!(frame.row_count(), 1);
            match &frame.fields[1].values {
                FieldValues::Number(v) => seen.push(v[0]),
                other => panic!("unexpected values {other:?}"),
            }
        }
        assert_eq!(seen, vec![Some(10.0), Some(20.0), Some(10.0)]);

        cancel.cancel();
        while rx.recv().await.is_some() {}
    }
}
