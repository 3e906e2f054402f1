//! 掷骰模式解析
//!
//! `NdS` 模式：N 个 S 面骰。非法或越界的数值会被归一化而不是报错。

use std::fmt;

/// 单次最多掷骰数量
pub const MAX_DICE: u32 = 10;
/// 骰子最大面数
pub const MAX_SIDES: u32 = 100;
/// 默认骰子面数
pub const DEFAULT_SIDES: u32 = 6;

/// 归一化后的掷骰规格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
}

impl Default for DiceSpec {
    fn default() -> Self {
        Self {
            count: 1,
            sides: DEFAULT_SIDES,
        }
    }
}

impl DiceSpec {
    /// 解析可选模式，空模式等同于 1d6
    pub fn parse(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return Self::default();
        };

        let mut parts = pattern.split('d');
        let count = parts.next().and_then(leading_int);
        let sides = parts.next().and_then(leading_int);

        Self {
            count: clamp_or(count, MAX_DICE, 1),
            sides: clamp_or(sides, MAX_SIDES, DEFAULT_SIDES),
        }
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// 在 1..=max 范围内保留，否则回落到默认值
fn clamp_or(value: Option<i64>, max: u32, fallback: u32) -> u32 {
    match value {
        Some(v) if v > 0 && v <= i64::from(max) => v as u32,
        _ => fallback,
    }
}

/// 读取前导整数（忽略前导空白，允许符号，遇到非数字停止）
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // 超长数字一律视为越界
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pattern_is_one_six_sided_die() {
        assert_eq!(DiceSpec::parse(None), DiceSpec::default());
        assert_eq!(DiceSpec::parse(Some("")), DiceSpec { count: 1, sides: 6 });
    }

    #[test]
    fn parses_valid_patterns() {
        assert_eq!(DiceSpec::parse(Some("3d6")), DiceSpec { count: 3, sides: 6 });
        assert_eq!(
            DiceSpec::parse(Some("10d100")),
            DiceSpec {
                count: 10,
                sides: 100
            }
        );
    }

    #[test]
    fn out_of_range_values_fall_back() {
        assert_eq!(DiceSpec::parse(Some("0d200")), DiceSpec { count: 1, sides: 6 });
        assert_eq!(DiceSpec::parse(Some("11d0")), DiceSpec { count: 1, sides: 6 });
        assert_eq!(DiceSpec::parse(Some("-2d-5")), DiceSpec { count: 1, sides: 6 });
    }

    #[test]
    fn garbage_is_normalised_not_rejected() {
        assert_eq!(DiceSpec::parse(Some("abc")), DiceSpec { count: 1, sides: 6 });
        assert_eq!(DiceSpec::parse(Some("4")), DiceSpec { count: 4, sides: 6 });
        assert_eq!(DiceSpec::parse(Some("2x d12")), DiceSpec { count: 2, sides: 12 });
        assert_eq!(DiceSpec::parse(Some(" 5d8y")), DiceSpec { count: 5, sides: 8 });
        assert_eq!(
            DiceSpec::parse(Some("99999999999999999999d4")),
            DiceSpec { count: 1, sides: 4 }
        );
    }

    #[test]
    fn displays_as_notation() {
        assert_eq!(DiceSpec { count: 2, sides: 20 }.to_string(), "2d20");
    }
}
