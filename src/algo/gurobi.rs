#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
use super::Ilp;
use crate::core::{
    Assignment, Backend, BackendError, LinExpr, Model, Outcome, Relation, Sense, Synchronizer,
};
use grb::prelude::*;
use tracing::debug;

impl From<grb::Error> for BackendError {
    fn from(err: grb::Error) -> Self {
        Self::Solver(err.to_string())
    }
}

/// Backend handing the model to the Gurobi optimizer.
#[derive(Clone, Debug)]
pub struct GurobiBackend {
    time_limit: f64,
}

impl GurobiBackend {
    /// Creates a backend stopping after `time_limit` seconds.
    #[must_use]
    pub const fn new(time_limit: f64) -> Self {
        Self { time_limit }
    }
}

impl Default for GurobiBackend {
    fn default() -> Self {
        Self::new(3600.0)
    }
}

/// Integer program synchronizer solved by Gurobi.
pub type GurobiIlp = Ilp<GurobiBackend>;

impl Default for Ilp<GurobiBackend> {
    fn default() -> Self {
        Self::new(GurobiBackend::default(), "ILP-Gurobi")
    }
}

fn create_model(name: &str, time_limit: f64) -> grb::Result<grb::Model> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    env.set(param::LogToConsole, 0)?;
    env.set(param::TimeLimit, time_limit)?;
    grb::Model::with_env(name, env)
}

fn expression(expr: &LinExpr, vars: &[Var]) -> grb::expr::LinExpr {
    let mut result = grb::expr::LinExpr::new();
    for &(var, coefficient) in expr.terms() {
        result.add_term(coefficient as f64, vars[var.index()]);
    }
    result.add_constant(expr.constant_value() as f64);
    result
}

impl Backend for GurobiBackend {
    fn solve(&mut self, model: &Model) -> Result<Outcome, BackendError> {
        let mut grb_model = create_model(model.name(), self.time_limit)?;

        let vars = model
            .vars()
            .iter()
            .map(|info| add_intvar!(grb_model, name: &info.name, bounds: ..))
            .collect::<grb::Result<Vec<_>>>()?;

        for named in model.constraints() {
            let expr = expression(&named.constraint.expr, &vars);
            let constraint = match named.constraint.relation {
                Relation::Eq => c!(expr == 0.0),
                Relation::Le => c!(expr <= 0.0),
                Relation::Ge => c!(expr >= 0.0),
            };
            grb_model.add_constr(&named.name, constraint)?;
        }

        if let Some((objective, sense)) = model.objective() {
            let sense = match sense {
                Sense::Minimize => ModelSense::Minimize,
                Sense::Maximize => ModelSense::Maximize,
            };
            grb_model.set_objective(expression(objective, &vars), sense)?;
        }

        grb_model.optimize()?;
        let status = grb_model.status()?;
        debug!(?status, "Gurobi finished");

        match status {
            Status::Optimal => {
                let values = vars
                    .iter()
                    .map(|var| grb_model.get_obj_attr(attr::X, var))
                    .map(|value| value.map(|value| value.round() as i128))
                    .collect::<grb::Result<Vec<_>>>()?;
                let objective = grb_model.get_attr(attr::ObjVal)?.round() as i128;
                Ok(Outcome::Optimal(Assignment::new(objective, values)))
            }
            Status::Infeasible | Status::InfOrUnbd => Ok(Outcome::Infeasible),
            Status::Unbounded => Ok(Outcome::Unbounded),
            status => Err(BackendError::Solver(format!(
                "optimization stopped with status {status:?}"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "gurobi"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Synchronizer> = || Box::new(GurobiIlp::default());
