//! Buffer Status Report decoding (TS 38.321 Section 6.1.3.1)
//!
//! A BSR carries, per reported LCG, a buffer size index into one of two
//! tables: a 5-bit table for the short formats and an 8-bit table for the
//! long formats. Index `k` means "at most `table[k]` bytes"; the top index of
//! each table means "more than the largest tabulated value".

use arrayvec::ArrayVec;
use macsched_common::LcgId;
use serde::{Deserialize, Serialize};

/// Largest buffer size the short table can express precisely.
pub const SHORT_BSR_MAX_BYTES: u32 = 150_000;

/// Largest buffer size the long table can express precisely.
pub const LONG_BSR_MAX_BYTES: u32 = 81_338_368;

/// Short-table index meaning "more than 150 000 bytes".
pub const SHORT_BSR_SATURATED_INDEX: u8 = 31;

/// Long-table index meaning "more than 81 338 368 bytes".
pub const LONG_BSR_SATURATED_INDEX: u8 = 254;

/// Buffer size levels of the 5-bit field (TS 38.321 Table 6.1.3.1-1).
const SHORT_BSR_TABLE: [u32; 31] = [
    0, 10, 14, 20, 28, 38, 53, 74, 102, 142, 198, 276, 384, 535, 745, 1038, 1446, 2014, 2806,
    3909, 5446, 7587, 10570, 14726, 20516, 28581, 39818, 55474, 77284, 107669, 150000,
];

/// Buffer size levels of the 8-bit field (TS 38.321 Table 6.1.3.1-2).
const LONG_BSR_TABLE: [u32; 254] = [
    0, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 22, 23, 25, 26, 28, 30, 32, 34, 36, 38, 40,
    43, 46, 49, 52, 55, 59, 62, 66, 71, 75, 80, 85, 91, 97, 103, 110, 117, 124, 132, 141, 150,
    160, 170, 181, 193, 205, 218, 233, 248, 264, 281, 299, 318, 339, 361, 384, 409, 436, 464,
    494, 526, 560, 597, 635, 677, 720, 767, 817, 870, 926, 987, 1051, 1119, 1191, 1269, 1351,
    1439, 1532, 1631, 1737, 1850, 1970, 2098, 2234, 2379, 2533, 2698, 2873, 3059, 3258, 3469,
    3694, 3934, 4189, 4461, 4751, 5059, 5387, 5737, 6109, 6506, 6928, 7378, 7857, 8367, 8910,
    9488, 10104, 10760, 11458, 12202, 12994, 13838, 14736, 15692, 16711, 17795, 18951, 20181,
    21491, 22885, 24371, 25953, 27638, 29431, 31342, 33376, 35543, 37850, 40307, 42923, 45709,
    48676, 51836, 55200, 58784, 62599, 66663, 70990, 75598, 80505, 85730, 91295, 97221, 103532,
    110252, 117409, 125030, 133146, 141789, 150992, 160793, 171231, 182345, 194182, 206786,
    220209, 234503, 249725, 265935, 283197, 301579, 321155, 342002, 364202, 387842, 413018,
    439827, 468377, 498780, 531156, 565634, 602350, 641449, 683087, 727427, 774645, 824928,
    878475, 935498, 996222, 1060888, 1129752, 1203085, 1281179, 1364342, 1452903, 1547213,
    1647644, 1754595, 1868488, 1989774, 2118933, 2256475, 2402946, 2558924, 2725027, 2901912,
    3090279, 3290873, 3504487, 3731968, 3974215, 4232186, 4506902, 4799451, 5110989, 5442750,
    5796046, 6172275, 6572925, 6999582, 7453933, 7937777, 8453028, 9001725, 9586039, 10208280,
    10870913, 11576557, 12328006, 13128233, 13980403, 14887889, 15854280, 16883401, 17979324,
    19146385, 20389201, 21712690, 23122088, 24622972, 26221280, 27923336, 29735875, 31666069,
    33721553, 35910462, 38241455, 40723756, 43367187, 46182206, 49179951, 52372284, 55771835,
    59392055, 63247269, 67352729, 71724679, 76380419, 81338368,
];

/// BSR MAC CE format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BsrFormat {
    /// Short BSR: one LCG, 5-bit index
    ShortBsr,
    /// Short Truncated BSR: one LCG, 5-bit index
    ShortTruncatedBsr,
    /// Long BSR: every LCG with data, 8-bit indexes
    LongBsr,
    /// Long Truncated BSR: a subset of the LCGs with data, 8-bit indexes
    LongTruncatedBsr,
}

impl BsrFormat {
    /// Returns true for the formats decoded with the 5-bit table
    pub fn is_short(self) -> bool {
        matches!(self, BsrFormat::ShortBsr | BsrFormat::ShortTruncatedBsr)
    }

    /// Index meaning "more than the table maximum" for this format.
    pub fn saturated_index(self) -> u8 {
        if self.is_short() {
            SHORT_BSR_SATURATED_INDEX
        } else {
            LONG_BSR_SATURATED_INDEX
        }
    }
}

/// Converts a buffer size index to bytes.
///
/// Saturated indexes decode to the table maximum. Returns `None` for indexes
/// outside the format's field, including the reserved long-table index 255.
pub fn buffer_size_index_to_bytes(format: BsrFormat, index: u8) -> Option<u32> {
    let table: &[u32] = if format.is_short() {
        &SHORT_BSR_TABLE
    } else {
        &LONG_BSR_TABLE
    };
    let index = usize::from(index);
    if index < table.len() {
        Some(table[index])
    } else if index == table.len() {
        table.last().copied()
    } else {
        None
    }
}

/// One reported LCG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BsrReport {
    /// Reported LCG
    pub lcg_id: LcgId,
    /// Buffer size index
    pub buffer_size_index: u8,
}

/// Decoded BSR indication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlBsrIndication {
    /// Format of the BSR CE
    pub format: BsrFormat,
    /// Reported LCGs
    pub reports: ArrayVec<BsrReport, { LcgId::MAX_NOF_LCGS }>,
}

impl UlBsrIndication {
    /// Short BSR for a single LCG.
    pub fn short(lcg_id: LcgId, buffer_size_index: u8) -> Self {
        let mut reports = ArrayVec::new();
        reports.push(BsrReport {
            lcg_id,
            buffer_size_index,
        });
        Self {
            format: BsrFormat::ShortBsr,
            reports,
        }
    }

    /// Long BSR from `(lcg_id, index)` pairs. Pairs beyond the number of
    /// LCGs are dropped.
    pub fn long(reports: impl IntoIterator<Item = (LcgId, u8)>) -> Self {
        Self {
            format: BsrFormat::LongBsr,
            reports: reports
                .into_iter()
                .take(LcgId::MAX_NOF_LCGS)
                .map(|(lcg_id, buffer_size_index)| BsrReport {
                    lcg_id,
                    buffer_size_index,
                })
                .collect(),
        }
    }
}
