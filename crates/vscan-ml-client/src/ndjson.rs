//! Incremental NDJSON decoding of the worker's process stream.

use vscan_models::WorkerRecord;

/// Splits an arbitrarily chunked byte stream into worker records.
///
/// A trailing partial line is kept until the next chunk completes it, so
/// the records produced do not depend on where chunk boundaries fall.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every record completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<WorkerRecord> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|b| *b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Flush a final line that had no trailing newline.
    pub fn finish(&mut self) -> Option<WorkerRecord> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    /// Bytes waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(line: &[u8]) -> Option<WorkerRecord> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(WorkerRecord::parse(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<WorkerRecord> {
        let mut decoder = NdjsonDecoder::new();
        let mut records = Vec::new();
        for chunk in chunks {
            records.extend(decoder.push(chunk));
        }
        records.extend(decoder.finish());
        records
    }

    #[test]
    fn test_line_split_across_chunks() {
        let records = decode_all(&[
            br#"{"status":"progress","fra"#,
            b"me\":5,\"total_frames\":10,\"progress\":0.5}\n{\"status\":\"complete\",\"detections\":[]}\n",
        ]);

        assert_eq!(
            records,
            vec![
                WorkerRecord::Progress {
                    frame: 5,
                    total_frames: 10,
                    progress: 0.5
                },
                WorkerRecord::Complete { detections: vec![] },
            ]
        );
    }

    #[test]
    fn test_any_split_matches_single_chunk() {
        let body = "{\"status\":\"starting\"}\r\n\n{\"status\":\"progress\",\"frame\":1,\"total_frames\":4,\"progress\":0.25}\nnot json\n{\"status\":\"complete\",\"detections\":[{\"timestamp\":1.5,\"category\":\"person\",\"conf\":0.9,\"bbox\":[1,2,3,4]}]}\n{\"error\":\"boom\"}";
        let whole = decode_all(&[body.as_bytes()]);
        assert_eq!(whole.len(), 5);
        assert!(whole[2].is_unparsed());
        assert_eq!(
            whole[4],
            WorkerRecord::Error {
                message: "boom".to_string()
            }
        );

        let bytes = body.as_bytes();
        for size in 1..bytes.len() {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            assert_eq!(decode_all(&chunks), whole, "chunk size {}", size);
        }
    }

    #[test]
    fn test_partial_line_is_buffered() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(br#"{"status":"star"#).is_empty());
        assert_eq!(decoder.pending(), 15);
        assert_eq!(decoder.push(b"ting\"}\n"), vec![WorkerRecord::Starting]);
        assert_eq!(decoder.pending(), 0);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multibyte_split() {
        let line = "{\"error\":\"caméra hors ligne\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let records = decode_all(&[&line[..split], &line[split..]]);
        assert_eq!(
            records,
            vec![WorkerRecord::Error {
                message: "caméra hors ligne".to_string()
            }]
        );
    }
}
