/// Knobs for PlainBuffer decoding.
#[derive(Debug, Clone)]
pub struct DecodeOption {
    pub(crate) verify_checksum: bool,
    pub(crate) max_rows: Option<usize>,
}

impl Default for DecodeOption {
    fn default() -> Self {
        DecodeOption {
            verify_checksum: true,
            max_rows: None,
        }
    }
}

impl DecodeOption {
    /// Recompute cell and row checksums and reject mismatches. Enabled by default.
    pub fn verify_checksum(self, verify_checksum: bool) -> Self {
        DecodeOption {
            verify_checksum,
            ..self
        }
    }

    /// Refuse buffers holding more than `max_rows` rows.
    pub fn max_rows(self, max_rows: usize) -> Self {
        DecodeOption {
            max_rows: Some(max_rows),
            ..self
        }
    }
}
