//! Request sequence numbers and per-stream staleness gates.

/// Hands out strictly increasing sequence numbers, one per request issued.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last: u64,
}

impl SequenceCounter {
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Admits a response only if its sequence number is above every number
/// admitted before it on the same stream.
#[derive(Debug, Default)]
pub struct SequenceGate {
    highest: Option<u64>,
}

impl SequenceGate {
    pub fn admit(&mut self, seq: u64) -> bool {
        match self.highest {
            Some(highest) if seq <= highest => false,
            _ => {
                self.highest = Some(seq);
                true
            }
        }
    }

    pub fn highest(&self) -> Option<u64> {
        self.highest
    }
}
