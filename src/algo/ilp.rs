use super::CongruenceBackend;
use crate::core::{
    Backend, Bus, Departure, LinExpr, Model, Outcome, Schedule, Sense, SolveError, Synchronizer,
    Var,
};
use crate::{cast_i128, cast_u128};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Integer program of a schedule with handles to its variables.
#[derive(Clone, Debug)]
pub struct ShuttleModel {
    pub model: Model,
    /// The synchronized timestamp, minimized.
    pub time: Var,
    /// One multiplier per real bus, in sequence order.
    pub multipliers: Vec<(Bus, Var)>,
    /// Product of all real periods, the upper bound of `time`.
    pub bound: u128,
}

/// Builds the integer program of a schedule.
///
/// For every real bus at position `i` with period `p` a multiplier `x_i >= 1` and the
/// constraint `t == p * x_i - i` are added. The timestamp `t` is minimized within
/// `1 <= t <= product of periods`.
///
/// # Errors
/// - If the schedule has no real buses.
/// - If the product of the periods overflows.
pub fn build_model(schedule: &Schedule) -> Result<ShuttleModel, SolveError> {
    if !schedule.has_buses() {
        return Err(SolveError::NoBuses);
    }

    let mut model = Model::new("shuttle");
    let time = model.add_var("t");

    let mut multipliers = Vec::new();
    let mut product = 1u128;
    for bus in schedule.buses() {
        let x = model.add_var(&format!("x_{}", bus.position));
        let departure = LinExpr::default()
            .term(i128::from(bus.period), x)
            .constant(-cast_i128(bus.position));
        model.add_constr(
            &format!("sync_{}", bus.position),
            LinExpr::var(time).equals(departure),
        );
        multipliers.push((bus, x));
        product = product
            .checked_mul(u128::from(bus.period))
            .ok_or(SolveError::Overflow)?;
    }

    model.set_objective(time, Sense::Minimize);

    for (bus, x) in &multipliers {
        model.add_constr(
            &format!("positive_{}", bus.position),
            LinExpr::var(*x).at_least(LinExpr::from(1_i128)),
        );
    }

    let bound = i128::try_from(product).map_err(|_| SolveError::Overflow)?;
    model.add_constr("lower", LinExpr::var(time).at_least(LinExpr::from(1_i128)));
    model.add_constr("upper", LinExpr::var(time).at_most(LinExpr::from(bound)));

    debug!(
        buses = multipliers.len(),
        constraints = model.constraints().len(),
        bound = %product,
        "Model built"
    );

    Ok(ShuttleModel {
        model,
        time,
        multipliers,
        bound: product,
    })
}

/// Narrows a solver value to `u64`. Values above the range overflow, negative ones
/// are reported by `invalid`.
fn narrow(value: i128, invalid: impl FnOnce() -> SolveError) -> Result<u64, SolveError> {
    u64::try_from(value).map_err(|_| {
        if value > 0 {
            SolveError::Overflow
        } else {
            invalid()
        }
    })
}

/// Solves a built model and maps the outcome to a departure.
///
/// # Errors
/// - If the model is infeasible or unbounded.
/// - If the backend fails.
/// - If the timestamp or a multiplier does not fit into `u64`.
/// - If the returned values do not satisfy the schedule.
pub fn solve_model(
    shuttle: &ShuttleModel,
    backend: &mut dyn Backend,
) -> Result<Departure, SolveError> {
    let bound = shuttle.bound;
    let outcome = shuttle.model.optimize(backend)?;
    debug!(%outcome, backend = backend.name(), "Backend finished");
    let assignment = match outcome {
        Outcome::Optimal(assignment) => assignment,
        Outcome::Infeasible => return Err(SolveError::Infeasible { bound }),
        Outcome::Unbounded => return Err(SolveError::Unbounded),
    };

    trace!(values = ?assignment.values(), "Solver values");
    let time = assignment.value(shuttle.time);
    let invalid = |position| SolveError::InvalidSolution {
        timestamp: u128::try_from(time).unwrap_or_default(),
        position,
    };
    let first = shuttle
        .multipliers
        .first()
        .map_or(0, |(bus, _)| bus.position);
    let timestamp = narrow(time, || invalid(first))?;
    if timestamp < 1 {
        return Err(invalid(first));
    }

    let mut multipliers = BTreeMap::new();
    for (bus, x) in &shuttle.multipliers {
        let value = narrow(assignment.value(*x), || invalid(bus.position))?;
        let departs = u128::from(bus.period) * u128::from(value);
        if departs != u128::from(timestamp) + cast_u128(bus.position) {
            return Err(invalid(bus.position));
        }
        multipliers.insert(bus.position, value);
    }

    let departure = Departure::new(timestamp, multipliers);
    info!(
        timestamp,
        objective = %assignment.objective(),
        backend = backend.name(),
        "Model solved"
    );
    Ok(departure)
}

/// Synchronizer formulating the schedule as an integer program.
#[derive(Clone, Debug)]
pub struct Ilp<B> {
    backend: B,
    name: &'static str,
}

impl<B: Backend> Ilp<B> {
    /// Creates a synchronizer solving with the given backend.
    #[must_use]
    pub const fn new(backend: B, name: &'static str) -> Self {
        Self { backend, name }
    }
}

/// Integer program synchronizer solved by the exact congruence backend.
pub type ExactIlp = Ilp<CongruenceBackend>;

impl Default for Ilp<CongruenceBackend> {
    fn default() -> Self {
        Self::new(CongruenceBackend, "ILP")
    }
}

impl<B: Backend> Synchronizer for Ilp<B> {
    fn synchronize(&mut self, schedule: &Schedule) -> Result<Departure, SolveError> {
        for (first, second, factor) in schedule.shared_factors() {
            warn!(
                first = first.period,
                second = second.period,
                factor,
                "Bus periods are not coprime"
            );
        }

        let shuttle = build_model(schedule)?;
        solve_model(&shuttle, &mut self.backend)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Synchronizer> = || Box::new(ExactIlp::default());
