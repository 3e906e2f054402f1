//! 随机整数与掷骰
//!
//! 所有随机性都经过 [`Randomizer`]，测试里可以换成脚本化的实现。

use std::collections::VecDeque;
use std::sync::Mutex;

use domain::DiceSpec;
use rand::Rng;

/// 随机整数范围
///
/// `max` 为闭区间上界，`emax` 为开区间上界，两者都给时 `max` 优先。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub emax: Option<i64>,
}

impl RandomRange {
    /// `[min, max]`
    pub fn inclusive(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            emax: None,
        }
    }

    /// `[0, emax)`
    pub fn below(emax: i64) -> Self {
        Self {
            min: None,
            max: None,
            emax: Some(emax),
        }
    }

    fn lower(&self) -> i64 {
        self.min.unwrap_or(0)
    }
}

/// 在范围内均匀取整数。范围为空或没有上界时返回下界。
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, range: RandomRange) -> i64 {
    let min = range.lower();
    match (range.max, range.emax) {
        (Some(max), _) if max >= min => rng.random_range(min..=max),
        (None, Some(emax)) if emax > min => rng.random_range(min..emax),
        _ => min,
    }
}

pub trait Randomizer: Send + Sync {
    fn random_int(&self, range: RandomRange) -> i64;
}

/// 基于线程本地 RNG 的默认实现
#[derive(Debug, Default)]
pub struct ThreadRandomizer;

impl Randomizer for ThreadRandomizer {
    fn random_int(&self, range: RandomRange) -> i64 {
        random_int(&mut rand::rng(), range)
    }
}

/// 按顺序返回预设值；用完后返回范围内的最大值
#[derive(Debug, Default)]
pub struct ScriptedRandomizer {
    values: Mutex<VecDeque<i64>>,
}

impl ScriptedRandomizer {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    pub fn push(&self, value: i64) {
        if let Ok(mut values) = self.values.lock() {
            values.push_back(value);
        }
    }
}

impl Randomizer for ScriptedRandomizer {
    fn random_int(&self, range: RandomRange) -> i64 {
        let scripted = self.values.lock().ok().and_then(|mut v| v.pop_front());
        scripted.unwrap_or_else(|| match (range.max, range.emax) {
            (Some(max), _) => max,
            (None, Some(emax)) => emax - 1,
            _ => range.lower(),
        })
    }
}

/// 掷骰：每颗骰子独立取 `[1, sides]`
pub fn roll_dice(spec: DiceSpec, randomizer: &dyn Randomizer) -> Vec<i64> {
    (0..spec.count)
        .map(|_| randomizer.random_int(RandomRange::inclusive(1, i64::from(spec.sides))))
        .collect()
}
