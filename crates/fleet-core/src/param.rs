//! Parameter expressions and their resolution to concrete scalars.
//!
//! Scenario files describe bounds, initial values and rates either as
//! literals or as expressions (a uniform range, a discrete choice).  The
//! engine only ever sees the resolved scalar: a [`ParamResolver`] turns every
//! expression into an `f64` once, at construction time.
//!
//! An *absent* parameter (`Option::None` on the spec field) means "no bound"
//! for `max`/`min`, "inactive attribute" for `init`, and "no rate limit" for
//! `rate`.  NaN is never used as a sentinel; resolvers reject it.
//!
//! # TOML shapes (with the `serde` feature)
//!
//! ```toml
//! max  = 100                        # Param::Value
//! min  = { low = 0, high = 5 }      # Param::Range
//! rate = { choice = [1, 2, 4] }     # Param::Choice
//! init = "max"                      # InitParam::Bound(BoundSide::Max)
//! ```

use crate::{FleetError, FleetResult, SimRng};

// ── Expressions ───────────────────────────────────────────────────────────────

/// A scalar parameter, possibly drawn at resolution time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(untagged))]
pub enum Param {
    /// A literal.
    Value(f64),
    /// Uniform draw from the closed interval `[low, high]`.
    Range { low: f64, high: f64 },
    /// Uniform draw from a finite set.
    Choice { choice: Vec<f64> },
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Value(v)
    }
}

/// Which bound an [`InitParam::Bound`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum BoundSide {
    Max,
    Min,
}

impl BoundSide {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundSide::Max => "max",
            BoundSide::Min => "min",
        }
    }
}

/// Initial value of a restricted attribute: an expression, or "start at the
/// upper / lower bound".
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(untagged))]
pub enum InitParam {
    Bound(BoundSide),
    Param(Param),
}

impl From<f64> for InitParam {
    fn from(v: f64) -> Self {
        InitParam::Param(Param::Value(v))
    }
}

impl From<BoundSide> for InitParam {
    fn from(side: BoundSide) -> Self {
        InitParam::Bound(side)
    }
}

// ── RestrictionSpec ───────────────────────────────────────────────────────────

/// Unresolved configuration of one restricted attribute.
///
/// `Default` is the unbounded, inactive, rate-free attribute.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct RestrictionSpec {
    pub max:  Option<Param>,
    pub min:  Option<Param>,
    pub init: Option<InitParam>,
    /// Throughput budget per time frame (one step).
    pub rate: Option<Param>,
}

impl RestrictionSpec {
    /// `[min, max]` bounds with the given initial value and no rate.
    pub fn bounded(min: f64, max: f64, init: impl Into<InitParam>) -> Self {
        Self {
            max:  Some(Param::Value(max)),
            min:  Some(Param::Value(min)),
            init: Some(init.into()),
            rate: None,
        }
    }

    /// Builder-style rate setter.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(Param::Value(rate));
        self
    }
}

/// A [`RestrictionSpec`] after every expression was drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedRestriction {
    pub max:  Option<f64>,
    pub min:  Option<f64>,
    pub init: Option<f64>,
    pub rate: Option<f64>,
}

impl ResolvedRestriction {
    /// Resolve every field of `spec` and validate the result.
    ///
    /// # Errors
    ///
    /// - [`FleetError::InvertedBounds`] if `min > max`.
    /// - [`FleetError::MissingBound`] if `init` names an absent bound.
    /// - [`FleetError::InitOutOfBounds`] if a literal `init` lies outside.
    /// - [`FleetError::InvalidParam`] for a negative rate or anything the
    ///   resolver rejects.
    pub fn resolve<R: ParamResolver + ?Sized>(
        attribute: &str,
        spec:      &RestrictionSpec,
        resolver:  &mut R,
    ) -> FleetResult<Self> {
        let max = resolver.resolve_opt(spec.max.as_ref())?;
        let min = resolver.resolve_opt(spec.min.as_ref())?;
        let rate = resolver.resolve_opt(spec.rate.as_ref())?;

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(FleetError::InvertedBounds {
                    attribute: attribute.to_owned(),
                    min:       lo,
                    max:       hi,
                });
            }
        }

        if let Some(r) = rate.filter(|r| *r < 0.0) {
            return Err(FleetError::InvalidParam(format!(
                "attribute {attribute:?}: rate {r} is negative"
            )));
        }

        let init = match &spec.init {
            None => None,
            Some(InitParam::Bound(side)) => {
                let bound = match side {
                    BoundSide::Max => max,
                    BoundSide::Min => min,
                };
                Some(bound.ok_or(FleetError::MissingBound {
                    attribute: attribute.to_owned(),
                    side:      side.as_str(),
                })?)
            }
            Some(InitParam::Param(p)) => {
                let v = resolver.resolve(p)?;
                let below = min.is_some_and(|lo| v < lo);
                let above = max.is_some_and(|hi| v > hi);
                if below || above {
                    return Err(FleetError::InitOutOfBounds {
                        attribute: attribute.to_owned(),
                        init:      v,
                    });
                }
                Some(v)
            }
        };

        Ok(Self { max, min, init, rate })
    }
}

// ── Resolvers ─────────────────────────────────────────────────────────────────

/// Turns parameter expressions into concrete scalars.
///
/// Implementations may be random; the engine calls them only while a
/// scenario is being constructed, never during a step.
pub trait ParamResolver {
    /// Resolve one expression.
    fn resolve(&mut self, param: &Param) -> FleetResult<f64>;

    /// Resolve an optional expression; absence passes through as `None`.
    fn resolve_opt(&mut self, param: Option<&Param>) -> FleetResult<Option<f64>> {
        param.map(|p| self.resolve(p)).transpose()
    }
}

fn finite(v: f64) -> FleetResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FleetError::InvalidParam(format!("{v} is not a finite number")))
    }
}

/// Resolver that accepts literals only.
///
/// Degenerate ranges (`low == high`) and single-element choices count as
/// literals; anything that would need a random draw is a configuration
/// error.
#[derive(Copy, Clone, Debug, Default)]
pub struct FixedResolver;

impl ParamResolver for FixedResolver {
    fn resolve(&mut self, param: &Param) -> FleetResult<f64> {
        match param {
            Param::Value(v) => finite(*v),
            Param::Range { low, high } if low == high => finite(*low),
            Param::Choice { choice } if choice.len() == 1 => finite(choice[0]),
            other => Err(FleetError::InvalidParam(format!(
                "{other:?} needs a random resolver"
            ))),
        }
    }
}

/// Resolver that draws ranges and choices from a seeded [`SimRng`].
pub struct RngResolver {
    rng: SimRng,
}

impl RngResolver {
    pub fn new(seed: u64) -> Self {
        Self { rng: SimRng::new(seed) }
    }
}

impl ParamResolver for RngResolver {
    fn resolve(&mut self, param: &Param) -> FleetResult<f64> {
        match param {
            Param::Value(v) => finite(*v),
            Param::Range { low, high } => {
                let (low, high) = (finite(*low)?, finite(*high)?);
                if low > high {
                    return Err(FleetError::InvalidParam(format!(
                        "range low {low} exceeds high {high}"
                    )));
                }
                Ok(self.rng.gen_range(low..=high))
            }
            Param::Choice { choice } => {
                let v = self
                    .rng
                    .choose(choice)
                    .copied()
                    .ok_or_else(|| FleetError::InvalidParam("empty choice list".into()))?;
                finite(v)
            }
        }
    }
}
