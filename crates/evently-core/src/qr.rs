//! # QR Pattern
//!
//! A deterministic 25×25 module bitmap derived from a ticket payload.
//!
//! This is a cosmetic generator: it looks like a QR code but carries no
//! error correction, no standard encoding and has no decode path. The same
//! payload always yields the same pattern.
//!
//! ## Layout
//! ```text
//!   ███████ ........... ███████
//!   █     █ .. data ... █     █
//!   █ ███ █ .. bits ... █ ███ █      finder: 7×7 ring + 3×3 core
//!   █ ███ █ ........... █ ███ █      separator: one light module
//!   █ ███ █ ........... █ ███ █
//!   █     █ ........... █     █
//!   ███████ ........... ███████
//!   ..........................
//!   ███████ ..................       data bits: SHA-256(payload ‖ counter)
//!   ...                              read MSB first, row-major
//! ```

use sha2::{Digest, Sha256};

/// Modules per side.
pub const QR_SIZE: usize = 25;

const FINDER: usize = 7;
const QUIET_ZONE: usize = 2;

/// Square bitmap; `true` is a dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPattern {
    modules: Vec<bool>,
}

impl QrPattern {
    /// Builds the pattern for a payload.
    ///
    /// ```rust
    /// use evently_core::qr::{QrPattern, QR_SIZE};
    ///
    /// let a = QrPattern::from_payload("EVENTLY|TKT-1-abc|evt|usr|Ada");
    /// let b = QrPattern::from_payload("EVENTLY|TKT-1-abc|evt|usr|Ada");
    /// assert_eq!(a, b);
    /// assert!(a.is_dark(0, 0));
    /// assert!(a.is_dark(0, QR_SIZE - 1));
    /// ```
    pub fn from_payload(payload: &str) -> Self {
        let mut data = BitStream::new(payload.as_bytes());
        let mut modules = vec![false; QR_SIZE * QR_SIZE];

        for row in 0..QR_SIZE {
            for col in 0..QR_SIZE {
                modules[row * QR_SIZE + col] = match finder_module(row, col) {
                    Some(dark) => dark,
                    None => data.next_bit(),
                };
            }
        }

        QrPattern { modules }
    }

    pub fn size(&self) -> usize {
        QR_SIZE
    }

    /// Whether the module at `(row, col)` is dark. Out-of-range is light.
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < QR_SIZE && col < QR_SIZE && self.modules[row * QR_SIZE + col]
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| **m).count()
    }

    /// Two characters per module, one line per row.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(QR_SIZE * (QR_SIZE * 2 * 3 + 1));
        for row in 0..QR_SIZE {
            for col in 0..QR_SIZE {
                out.push_str(if self.is_dark(row, col) { "██" } else { "  " });
            }
            out.push('\n');
        }
        out
    }

    /// Standalone SVG with a light quiet zone.
    pub fn to_svg(&self, module_px: u32) -> String {
        let px = module_px.max(1);
        let side = (QR_SIZE + QUIET_ZONE * 2) as u32 * px;

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{side}\" height=\"{side}\" \
             viewBox=\"0 0 {side} {side}\" shape-rendering=\"crispEdges\">\
             <rect width=\"{side}\" height=\"{side}\" fill=\"#ffffff\"/>"
        );
        for row in 0..QR_SIZE {
            for col in 0..QR_SIZE {
                if self.is_dark(row, col) {
                    let x = (col + QUIET_ZONE) as u32 * px;
                    let y = (row + QUIET_ZONE) as u32 * px;
                    svg.push_str(&format!(
                        "<rect x=\"{x}\" y=\"{y}\" width=\"{px}\" height=\"{px}\" fill=\"#000000\"/>"
                    ));
                }
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Fixed module value inside a finder square or its separator, if any.
fn finder_module(row: usize, col: usize) -> Option<bool> {
    let origins = [(0, 0), (0, QR_SIZE - FINDER), (QR_SIZE - FINDER, 0)];

    for (r0, c0) in origins {
        // Separator is one module wider on the sides that face the data area
        let r_lo = r0.saturating_sub(1);
        let c_lo = c0.saturating_sub(1);
        let r_hi = (r0 + FINDER).min(QR_SIZE - 1);
        let c_hi = (c0 + FINDER).min(QR_SIZE - 1);

        if row < r_lo || row > r_hi || col < c_lo || col > c_hi {
            continue;
        }

        if row < r0 || row >= r0 + FINDER || col < c0 || col >= c0 + FINDER {
            return Some(false);
        }

        let dr = row - r0;
        let dc = col - c0;
        let ring = dr == 0 || dr == FINDER - 1 || dc == 0 || dc == FINDER - 1;
        let core = (2..=4).contains(&dr) && (2..=4).contains(&dc);
        return Some(ring || core);
    }

    None
}

/// SHA-256 in counter mode, consumed one bit at a time.
struct BitStream<'a> {
    payload: &'a [u8],
    counter: u32,
    block: [u8; 32],
    pos: usize,
}

impl<'a> BitStream<'a> {
    fn new(payload: &'a [u8]) -> Self {
        let mut stream = BitStream {
            payload,
            counter: 0,
            block: [0; 32],
            pos: 0,
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.payload);
        hasher.update(self.counter.to_be_bytes());
        self.block.copy_from_slice(&hasher.finalize());
        self.counter += 1;
        self.pos = 0;
    }

    fn next_bit(&mut self) -> bool {
        if self.pos == self.block.len() * 8 {
            self.refill();
        }
        let byte = self.block[self.pos / 8];
        let bit = (byte >> (7 - self.pos % 8)) & 1 == 1;
        self.pos += 1;
        bit
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
