//! Solver-agnostic integer program.
//!
//! A [`Model`] only records variables, linear constraints and the objective.
//! Solving is delegated to a [`Backend`], which reports an [`Outcome`]. Values
//! are exposed only for [`Outcome::Optimal`].

use super::BackendError;
use std::fmt::{Display, Formatter};

/// Handle of an integer decision variable inside a [`Model`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Var(usize);

impl Var {
    /// Index of the variable in creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// An integer decision variable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VarInfo {
    pub name: String,
}

/// Linear expression `sum(coefficient * var) + constant`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, i128)>,
    constant: i128,
}

impl LinExpr {
    /// Expression consisting of a single variable.
    #[must_use]
    pub fn var(var: Var) -> Self {
        Self::default().term(1, var)
    }

    /// Adds `coefficient * var`; repeated variables are summed.
    #[must_use]
    pub fn term(mut self, coefficient: i128, var: Var) -> Self {
        match self.terms.iter_mut().find(|(v, _)| *v == var) {
            Some((_, c)) => *c += coefficient,
            None => self.terms.push((var, coefficient)),
        }
        self.terms.retain(|&(_, c)| c != 0);
        self
    }

    /// Adds a constant.
    #[must_use]
    pub const fn constant(mut self, constant: i128) -> Self {
        self.constant += constant;
        self
    }

    /// Non-zero terms.
    #[must_use]
    pub fn terms(&self) -> &[(Var, i128)] {
        &self.terms
    }

    #[must_use]
    pub const fn constant_value(&self) -> i128 {
        self.constant
    }

    /// Coefficient of `var`, zero if absent.
    #[must_use]
    pub fn coefficient(&self, var: Var) -> i128 {
        self.terms
            .iter()
            .find_map(|&(v, c)| (v == var).then_some(c))
            .unwrap_or_default()
    }

    /// Evaluates the expression; `None` on overflow.
    #[must_use]
    pub fn eval(&self, values: &[i128]) -> Option<i128> {
        self.terms.iter().try_fold(self.constant, |acc, &(var, c)| {
            acc.checked_add(c.checked_mul(*values.get(var.index())?)?)
        })
    }

    /// `self == rhs`
    #[must_use]
    pub fn equals(self, rhs: Self) -> Constraint {
        Constraint::new(self.minus(rhs), Relation::Eq)
    }

    /// `self <= rhs`
    #[must_use]
    pub fn at_most(self, rhs: Self) -> Constraint {
        Constraint::new(self.minus(rhs), Relation::Le)
    }

    /// `self >= rhs`
    #[must_use]
    pub fn at_least(self, rhs: Self) -> Constraint {
        Constraint::new(self.minus(rhs), Relation::Ge)
    }

    fn minus(self, rhs: Self) -> Self {
        let lhs = self.constant(-rhs.constant);
        rhs.terms
            .into_iter()
            .fold(lhs, |expr, (var, c)| expr.term(-c, var))
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        Self::var(var)
    }
}

impl From<i128> for LinExpr {
    fn from(constant: i128) -> Self {
        Self::default().constant(constant)
    }
}

/// Relation of a constraint expression to zero.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

/// Linear constraint `expr (relation) 0`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constraint {
    pub expr: LinExpr,
    pub relation: Relation,
}

impl Constraint {
    #[must_use]
    pub const fn new(expr: LinExpr, relation: Relation) -> Self {
        Self { expr, relation }
    }

    /// Checks the constraint against concrete values.
    #[must_use]
    pub fn holds(&self, values: &[i128]) -> bool {
        self.expr
            .eval(values)
            .is_some_and(|value| match self.relation {
                Relation::Eq => value == 0,
                Relation::Le => value <= 0,
                Relation::Ge => value >= 0,
            })
    }
}

/// Optimization direction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A named constraint of the model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedConstraint {
    pub name: String,
    pub constraint: Constraint,
}

/// Integer program under construction.
#[derive(Clone, Debug, Default)]
pub struct Model {
    name: String,
    vars: Vec<VarInfo>,
    constraints: Vec<NamedConstraint>,
    objective: Option<(LinExpr, Sense)>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an unbounded integer variable.
    pub fn add_var(&mut self, name: &str) -> Var {
        self.vars.push(VarInfo { name: name.into() });
        Var(self.vars.len() - 1)
    }

    /// Adds a linear constraint.
    pub fn add_constr(&mut self, name: &str, constraint: Constraint) {
        self.constraints.push(NamedConstraint {
            name: name.into(),
            constraint,
        });
    }

    /// Sets the objective, replacing any previous one.
    pub fn set_objective(&mut self, expr: impl Into<LinExpr>, sense: Sense) {
        self.objective = Some((expr.into(), sense));
    }

    #[must_use]
    pub fn vars(&self) -> &[VarInfo] {
        &self.vars
    }

    #[must_use]
    pub fn var_name(&self, var: Var) -> &str {
        &self.vars[var.index()].name
    }

    #[must_use]
    pub fn constraints(&self) -> &[NamedConstraint] {
        &self.constraints
    }

    #[must_use]
    pub const fn objective(&self) -> Option<&(LinExpr, Sense)> {
        self.objective.as_ref()
    }

    /// Solves the model with the given backend.
    ///
    /// # Errors
    /// - If the backend fails or cannot handle the model.
    pub fn optimize(&self, backend: &mut dyn Backend) -> Result<Outcome, BackendError> {
        backend.solve(self)
    }
}

/// Values of an optimal solution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assignment {
    objective: i128,
    values: Vec<i128>,
}

impl Assignment {
    #[must_use]
    pub const fn new(objective: i128, values: Vec<i128>) -> Self {
        Self { objective, values }
    }

    #[must_use]
    pub const fn objective(&self) -> i128 {
        self.objective
    }

    /// Value of a variable.
    #[must_use]
    pub fn value(&self, var: Var) -> i128 {
        self.values[var.index()]
    }

    #[must_use]
    pub fn values(&self) -> &[i128] {
        &self.values
    }
}

/// Result of a solve call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Optimal(Assignment),
    Infeasible,
    Unbounded,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal(assignment) => write!(f, "optimal ({})", assignment.objective),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// An integer program solver.
pub trait Backend {
    /// Solves the model. Only [`Outcome::Optimal`] carries values.
    ///
    /// # Errors
    /// - If the solver fails or the model shape is not supported.
    fn solve(&mut self, model: &Model) -> Result<Outcome, BackendError>;

    /// Returns the name of the backend.
    fn name(&self) -> &str;
}
