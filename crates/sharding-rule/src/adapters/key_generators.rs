//! Built-in key generators.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::domain::{RuleResult, ShardingRuleError, MAX_WORKER_ID};
use crate::ports::{GeneratedKey, KeyGenerateAlgorithm};

/// Random UUID keys rendered without dashes.
#[derive(Debug, Clone, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerateAlgorithm for UuidKeyGenerator {
    fn type_name(&self) -> &str {
        "UUID"
    }

    fn generate_key(&self) -> RuleResult<GeneratedKey> {
        Ok(GeneratedKey::Text(Uuid::new_v4().simple().to_string()))
    }
}

/// 2016-11-01T00:00:00Z in milliseconds.
pub const SNOWFLAKE_EPOCH_MILLIS: i64 = 1_477_958_400_000;

const SEQUENCE_BITS: u32 = 12;
const WORKER_ID_BITS: u32 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS;

/// Snowflake keys: 41-bit millisecond timestamp, 10-bit worker id, 12-bit
/// sequence.
///
/// When the sequence of a millisecond is exhausted, or the wall clock moves
/// backwards, the generator borrows the next logical millisecond instead of
/// waiting.
#[derive(Debug)]
pub struct SnowflakeKeyGenerator {
    worker_id: i64,
    state: Mutex<SnowflakeState>,
}

#[derive(Debug, Default)]
struct SnowflakeState {
    last_millis: i64,
    sequence: i64,
}

impl SnowflakeKeyGenerator {
    /// Generator for `worker_id` (0..=1023).
    pub fn new(worker_id: u32) -> RuleResult<Self> {
        if worker_id > MAX_WORKER_ID {
            return Err(ShardingRuleError::KeyGeneration(format!(
                "worker id {} exceeds {}",
                worker_id, MAX_WORKER_ID
            )));
        }
        Ok(Self {
            worker_id: i64::from(worker_id),
            state: Mutex::new(SnowflakeState::default()),
        })
    }

    /// Configured worker id.
    pub fn worker_id(&self) -> u32 {
        self.worker_id as u32
    }

    fn current_millis() -> RuleResult<i64> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ShardingRuleError::KeyGeneration(e.to_string()))?;
        Ok(elapsed.as_millis() as i64)
    }
}

impl KeyGenerateAlgorithm for SnowflakeKeyGenerator {
    fn type_name(&self) -> &str {
        "SNOWFLAKE"
    }

    fn generate_key(&self) -> RuleResult<GeneratedKey> {
        let now = Self::current_millis()?;
        let mut state = self.state.lock();

        let mut millis = now.max(state.last_millis);
        if millis == state.last_millis {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                millis += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_millis = millis;

        let key = ((millis - SNOWFLAKE_EPOCH_MILLIS) << TIMESTAMP_SHIFT)
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence;
        Ok(GeneratedKey::Number(key))
    }
}
