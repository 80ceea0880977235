//! Exact backend for congruence-structured integer programs.
//!
//! Accepted models optimize a single variable `t`. Every constraint is either a
//! bound on one variable or an equality `a * t + b * x + c == 0` linking `t` to an
//! auxiliary variable `x` that occurs in no other equality. Each link turns into
//! the congruence `a * t ≡ -c (mod |b|)` and the bounds of `x` into bounds of `t`.
//! The congruences are merged with the Chinese remainder theorem, so moduli may
//! share factors, and the optimum is the extreme member within the bounds of `t`.

use crate::core::{
    Assignment, Backend, BackendError, Congruence, Model, Outcome, Overflow, Relation, Sense, Var,
};
use ahash::{HashMap, HashMapExt};
use tracing::trace;

/// `floor(n / d)` for any non-zero `d`.
fn floor_div(n: i128, d: i128) -> Result<i128, Overflow> {
    let q = n.checked_div(d).ok_or(Overflow)?;
    if n % d != 0 && ((n < 0) != (d < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// `ceil(n / d)` for any non-zero `d`.
fn ceil_div(n: i128, d: i128) -> Result<i128, Overflow> {
    let q = n.checked_div(d).ok_or(Overflow)?;
    if n % d != 0 && ((n < 0) == (d < 0)) {
        Ok(q + 1)
    } else {
        Ok(q)
    }
}

/// Integer interval of a variable. `None` means unbounded on that side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Bounds {
    lower: Option<i128>,
    upper: Option<i128>,
}

impl Bounds {
    fn at_least(&mut self, value: i128) {
        self.lower = Some(self.lower.map_or(value, |lower| lower.max(value)));
    }

    fn at_most(&mut self, value: i128) {
        self.upper = Some(self.upper.map_or(value, |upper| upper.min(value)));
    }

    /// Restricts by `coefficient * v (relation) rhs`. Returns `false` if no value remains.
    fn restrict(
        &mut self,
        coefficient: i128,
        rhs: i128,
        relation: Relation,
    ) -> Result<bool, Overflow> {
        if coefficient == 0 {
            return Ok(match relation {
                Relation::Eq => rhs == 0,
                Relation::Le => rhs >= 0,
                Relation::Ge => rhs <= 0,
            });
        }

        match (relation, coefficient > 0) {
            (Relation::Eq, _) => {
                if rhs.checked_rem(coefficient).ok_or(Overflow)? != 0 {
                    return Ok(false);
                }
                let value = rhs.checked_div(coefficient).ok_or(Overflow)?;
                self.at_least(value);
                self.at_most(value);
            }
            (Relation::Ge, true) | (Relation::Le, false) => {
                self.at_least(ceil_div(rhs, coefficient)?);
            }
            (Relation::Le, true) | (Relation::Ge, false) => {
                self.at_most(floor_div(rhs, coefficient)?);
            }
        }

        Ok(self.is_feasible())
    }

    const fn is_feasible(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        }
    }

    /// Any value inside the interval, preferring the lower end.
    fn any(&self) -> i128 {
        self.lower.or(self.upper).unwrap_or_default()
    }
}

/// Equality `a * t + b * x + c == 0` tying an auxiliary variable to the target.
#[derive(Clone, Copy, Debug)]
struct Link {
    a: i128,
    b: i128,
    c: i128,
}

impl Link {
    /// Value of the auxiliary variable for a given target value.
    fn solve(&self, t: i128) -> Result<i128, Overflow> {
        let numerator = self
            .a
            .checked_mul(t)
            .and_then(|at| at.checked_add(self.c))
            .and_then(i128::checked_neg)
            .ok_or(Overflow)?;
        numerator.checked_div(self.b).ok_or(Overflow)
    }

    /// Transfers `x >= lower` and `x <= upper` onto the target.
    fn project(&self, bounds: Bounds, target: &mut Bounds) -> Result<bool, Overflow> {
        let scaled = |value: i128| {
            value
                .checked_mul(self.b)
                .and_then(|scaled| scaled.checked_add(self.c))
                .ok_or(Overflow)
        };
        let coefficient = self.a.checked_neg().ok_or(Overflow)?;

        // x = -(a t + c) / b, multiplying by b flips the relation when b < 0
        let (at_least, at_most) = if self.b > 0 {
            (Relation::Ge, Relation::Le)
        } else {
            (Relation::Le, Relation::Ge)
        };

        if let Some(lower) = bounds.lower {
            if !target.restrict(coefficient, scaled(lower)?, at_least)? {
                return Ok(false);
            }
        }
        if let Some(upper) = bounds.upper {
            if !target.restrict(coefficient, scaled(upper)?, at_most)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Values of the target for which the auxiliary variable is integral.
    fn congruence(&self) -> Option<Congruence> {
        let modulus = self.b.checked_abs()?;
        Congruence::solve_linear(self.a, self.c.checked_neg()?, modulus)
    }
}

/// Exact solver for programs whose equalities are linear congruences of the objective variable.
#[derive(Clone, Copy, Debug, Default)]
pub struct CongruenceBackend;

/// Bounds of every variable and the links of the auxiliary variables, `None` if a
/// constraint already rules out every value.
type Classified = Option<(Vec<Bounds>, HashMap<usize, Link>)>;

/// Sorts every constraint into a bound or a link to `target`.
fn classify(model: &Model, target: Var) -> Result<Classified, BackendError> {
    let mut bounds = vec![Bounds::default(); model.vars().len()];
    let mut links: HashMap<usize, Link> = HashMap::new();

    for named in model.constraints() {
        let expr = &named.constraint.expr;
        let relation = named.constraint.relation;
        let rhs = expr.constant_value().checked_neg().ok_or(Overflow)?;

        match *expr.terms() {
            [] => {
                if !Bounds::default().restrict(0, rhs, relation)? {
                    return Ok(None);
                }
            }
            [(var, coefficient)] => {
                if !bounds[var.index()].restrict(coefficient, rhs, relation)? {
                    return Ok(None);
                }
            }
            [(first, first_coefficient), (second, second_coefficient)]
                if relation == Relation::Eq && (first == target || second == target) =>
            {
                let (aux, a, b) = if first == target {
                    (second, first_coefficient, second_coefficient)
                } else {
                    (first, second_coefficient, first_coefficient)
                };
                let link = Link {
                    a,
                    b,
                    c: expr.constant_value(),
                };
                if links.insert(aux.index(), link).is_some() {
                    return Err(unsupported(&format!(
                        "variable '{}' occurs in more than one equality",
                        model.var_name(aux)
                    )));
                }
            }
            _ => {
                return Err(unsupported(&format!(
                    "constraint '{}' is not a bound or a link to '{}'",
                    named.name,
                    model.var_name(target)
                )));
            }
        }
    }

    Ok(Some((bounds, links)))
}

/// Extreme member of the congruence within the bounds, `None` if the bound on the
/// optimized side is missing.
fn extreme(
    congruence: Congruence,
    bounds: Bounds,
    minimize: bool,
) -> Result<Option<i128>, Overflow> {
    if minimize {
        let Some(lower) = bounds.lower else {
            return Ok(None);
        };
        return congruence.smallest_at_least(lower).map(Some);
    }

    let Some(upper) = bounds.upper else {
        return Ok(None);
    };
    let mirrored = Congruence::new(
        congruence.residue().checked_neg().ok_or(Overflow)?,
        congruence.modulus(),
    );
    let t = mirrored
        .smallest_at_least(upper.checked_neg().ok_or(Overflow)?)?
        .checked_neg()
        .ok_or(Overflow)?;
    Ok(Some(t))
}

/// Values of every variable once the target is fixed, `None` if a free variable
/// has an empty interval.
fn assemble(
    t: i128,
    target: Var,
    bounds: &[Bounds],
    links: &HashMap<usize, Link>,
) -> Result<Option<Vec<i128>>, Overflow> {
    let mut values = Vec::with_capacity(bounds.len());
    for (index, var_bounds) in bounds.iter().enumerate() {
        let value = match links.get(&index) {
            _ if index == target.index() => t,
            Some(link) => link.solve(t)?,
            None if var_bounds.is_feasible() => var_bounds.any(),
            None => return Ok(None),
        };
        values.push(value);
    }
    Ok(Some(values))
}

impl Backend for CongruenceBackend {
    fn solve(&mut self, model: &Model) -> Result<Outcome, BackendError> {
        let (objective, sense) = model
            .objective()
            .ok_or_else(|| unsupported("model has no objective"))?;
        let &[(target, weight)] = objective.terms() else {
            return Err(unsupported("objective must be a single variable"));
        };
        let minimize = (*sense == Sense::Minimize) == (weight > 0);

        let Some((bounds, links)) = classify(model, target)? else {
            return Ok(Outcome::Infeasible);
        };

        let mut target_bounds = bounds[target.index()];
        let mut congruence = Congruence::ANY;
        for (aux, link) in &links {
            if !link.project(bounds[*aux], &mut target_bounds)? {
                return Ok(Outcome::Infeasible);
            }
            let Some(merged) = link
                .congruence()
                .map(|c| congruence.merge(c))
                .transpose()?
                .flatten()
            else {
                return Ok(Outcome::Infeasible);
            };
            congruence = merged;
        }

        trace!(
            residue = %congruence.residue(),
            modulus = %congruence.modulus(),
            lower = ?target_bounds.lower,
            upper = ?target_bounds.upper,
            "Congruences merged"
        );

        if !target_bounds.is_feasible() {
            return Ok(Outcome::Infeasible);
        }

        let Some(t) = extreme(congruence, target_bounds, minimize)? else {
            return Ok(Outcome::Unbounded);
        };

        if target_bounds.upper.is_some_and(|upper| t > upper)
            || target_bounds.lower.is_some_and(|lower| t < lower)
        {
            return Ok(Outcome::Infeasible);
        }

        let Some(values) = assemble(t, target, &bounds, &links)? else {
            return Ok(Outcome::Infeasible);
        };

        debug_assert!(
            model
                .constraints()
                .iter()
                .all(|named| named.constraint.holds(&values)),
            "solution violates a constraint"
        );

        let objective = objective.eval(&values).ok_or(Overflow)?;
        Ok(Outcome::Optimal(Assignment::new(objective, values)))
    }

    fn name(&self) -> &'static str {
        "congruence"
    }
}

fn unsupported(reason: &str) -> BackendError {
    BackendError::Unsupported(reason.into())
}
