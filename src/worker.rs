use crate::aggregate::Aggregator;
use crate::distributor::{Batch, Consumer};
use crate::error::Result;
use crate::number;
use crate::splitter;

/// Pops batches until the queue reports completion and folds each into a
/// private [`Aggregator`]. The first malformed record ends the loop.
pub fn consume(consumer: Consumer) -> Result<(Aggregator, u64)> {
    let mut agg = Aggregator::new();
    let mut records = 0;
    while let Some(batch) = consumer.pop() {
        records += fold_batch(&mut agg, &batch)?;
        consumer.recycle(batch.into_buffer());
    }
    Ok((agg, records))
}

/// Parses every record of `batch` into `agg`; returns how many were folded.
pub fn fold_batch(agg: &mut Aggregator, batch: &Batch) -> Result<u64> {
    for (offset, line) in batch.records() {
        let record = splitter::split_record(line, offset)?;
        let value_offset = offset + record.name.len() as u64 + 1;
        let value = number::decode(record.value, value_offset)?;
        agg.record(record.name, value);
    }
    Ok(batch.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor;
    use crate::error::BrcError;

    fn batch(text: &str, offset: u64) -> Batch {
        let mut ends = Vec::new();
        crate::splitter::find_records(text.as_bytes(), &mut ends);
        Batch::new(text.as_bytes().to_vec(), ends, offset)
    }

    #[test]
    fn folds_batches_until_queue_closes() {
        let (producer, consumer) = distributor::channel(4);
        producer.push(batch("Paris;10.0\nOslo;-3.4\n", 0));
        producer.push(batch("Paris;12.0\nParis;20.0\n", 21));
        drop(producer);

        let (agg, records) = consume(consumer).unwrap();
        assert_eq!(records, 4);
        let paris = agg.get(b"Paris").unwrap();
        assert_eq!((paris.min, paris.max, paris.count), (100, 200, 3));
        assert_eq!(paris.mean(), 14.0);
        assert_eq!(agg.get(b"Oslo").unwrap().sum, -34);
    }

    #[test]
    fn reports_offset_of_bad_value() {
        let mut agg = Aggregator::new();
        match fold_batch(&mut agg, &batch("Oslo;1.0\nRome;1.25\n", 1000)) {
            Err(BrcError::MalformedValue { offset, token }) => {
                assert_eq!(offset, 1014);
                assert_eq!(token, "1.25");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reports_offset_of_record_without_separator() {
        let mut agg = Aggregator::new();
        let err = fold_batch(&mut agg, &batch("Oslo;1.0\n\nRome;2.0\n", 50)).unwrap_err();
        assert!(matches!(err, BrcError::MalformedRecord { offset: 59 }));
    }

    #[test]
    fn crlf_records_fold_like_lf() {
        let mut crlf = Aggregator::new();
        fold_batch(&mut crlf, &batch("Oslo;1.0\r\nOslo;3.0\r\n", 0)).unwrap();
        let mut lf = Aggregator::new();
        fold_batch(&mut lf, &batch("Oslo;1.0\nOslo;3.0\n", 0)).unwrap();
        assert_eq!(crlf.get(b"Oslo"), lf.get(b"Oslo"));
    }
}
