use super::*;

/// An exact asset amount: `value / 10^scale`.
#[derive(Debug, Default, Clone, Copy, SerializeDisplay, DeserializeFromStr)]
pub struct Decimal {
  value: u128,
  scale: u8,
}

impl Decimal {
  pub const ZERO: Self = Self { value: 0, scale: 0 };

  /// An amount of base units with `divisibility` decimal places.
  pub fn new(amount: u64, divisibility: u8) -> Self {
    Self {
      value: amount.into(),
      scale: divisibility,
    }
  }

  fn rescale(self, scale: u8) -> Result<Self, SnafuError> {
    let factor = 10u128
      .checked_pow((scale - self.scale).into())
      .ok_or(SnafuError::DecimalOverflow)?;

    Ok(Self {
      value: self
        .value
        .checked_mul(factor)
        .ok_or(SnafuError::DecimalOverflow)?,
      scale,
    })
  }

  pub fn checked_add(self, other: Self) -> Result<Self, SnafuError> {
    let scale = self.scale.max(other.scale);

    let a = self.rescale(scale)?;
    let b = other.rescale(scale)?;

    Ok(Self {
      value: a.value.checked_add(b.value).ok_or(SnafuError::DecimalOverflow)?,
      scale,
    })
  }

  pub fn add_amount(&mut self, record: &AssetRecord) -> Result<(), SnafuError> {
    *self = self.checked_add(Self::new(record.amount, record.divisibility))?;
    Ok(())
  }

  fn normalize(self) -> Self {
    let mut normalized = self;

    while normalized.scale > 0 && normalized.value % 10 == 0 {
      normalized.value /= 10;
      normalized.scale -= 1;
    }

    normalized
  }
}

impl PartialEq for Decimal {
  fn eq(&self, other: &Self) -> bool {
    let (a, b) = (self.normalize(), other.normalize());
    a.value == b.value && a.scale == b.scale
  }
}

impl Eq for Decimal {}

impl Display for Decimal {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let Self { value, scale } = self.normalize();

    let Some(magnitude) = 10u128.checked_pow(scale.into()) else {
      return write!(f, "0.{value:0>width$}", width = usize::from(scale));
    };

    let integer = value / magnitude;
    let fraction = value % magnitude;

    write!(f, "{integer}")?;

    if fraction > 0 {
      write!(f, ".{fraction:0>width$}", width = usize::from(scale))?;
    }

    Ok(())
  }
}

impl FromStr for Decimal {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));

    ensure!(
      !integer.is_empty() || !fraction.is_empty(),
      "invalid decimal `{s}`"
    );

    ensure!(
      integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()),
      "invalid decimal `{s}`"
    );

    let scale = u8::try_from(fraction.len()).context("too many decimal places")?;

    let digits = format!("{integer}{fraction}");

    let value = if digits.is_empty() {
      0
    } else {
      digits.parse::<u128>().context("decimal out of range")?
    };

    Ok(Self { value, scale })
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn decimal(s: &str) -> Decimal {
    s.parse().unwrap()
  }

  #[test]
  fn scales_base_units_by_divisibility() {
    assert_eq!(Decimal::new(400, 2).to_string(), "4");
    assert_eq!(Decimal::new(1234, 2).to_string(), "12.34");
    assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
    assert_eq!(Decimal::new(1000, 0).to_string(), "1000");
  }

  #[test]
  fn addition_is_exact() {
    let mut total = Decimal::ZERO;

    for _ in 0..10 {
      total = total.checked_add(Decimal::new(1, 1)).unwrap();
    }

    assert_eq!(total, decimal("1"));
    assert_eq!(
      Decimal::new(1, 1).checked_add(Decimal::new(2, 3)).unwrap(),
      decimal("0.102")
    );
  }

  #[test]
  fn equality_ignores_trailing_zeros() {
    assert_eq!(decimal("4.00"), decimal("4"));
    assert_eq!(Decimal::new(600, 2), Decimal::new(6, 0));
    assert_ne!(decimal("4.01"), decimal("4"));
  }

  #[test]
  fn overflow_is_an_error() {
    assert!(matches!(
      Decimal {
        value: u128::MAX,
        scale: 0
      }
      .checked_add(Decimal::new(1, 0)),
      Err(SnafuError::DecimalOverflow)
    ));
  }

  #[test]
  fn parse() {
    assert_eq!(decimal("12.34"), Decimal::new(1234, 2));
    assert_eq!(decimal(".5"), Decimal::new(5, 1));
    assert_eq!(decimal("7."), Decimal::new(7, 0));
    assert!("".parse::<Decimal>().is_err());
    assert!("1.2.3".parse::<Decimal>().is_err());
    assert!("-1".parse::<Decimal>().is_err());
  }

  #[test]
  fn serializes_as_string() {
    assert_eq!(
      serde_json::to_string(&Decimal::new(250, 2)).unwrap(),
      "\"2.5\""
    );
    assert_eq!(
      serde_json::from_str::<Decimal>("\"2.50\"").unwrap(),
      Decimal::new(25, 1)
    );
  }
}
