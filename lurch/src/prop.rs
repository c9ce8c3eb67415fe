//! Classical propositional logic.
//!
//! Expressions are abstracted to atoms, where two expressions yield
//! the same atom iff they are equal up to renaming of bound variables.
//! Entailment is decided by refuting the premises together with the
//! negated goal, using a Tseitin encoding to clauses and DPLL search.

use crate::Expr;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use fnv::FnvHashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prop {
    True,
    False,
    Atom(usize),
    And(Vec<Prop>),
    Implies(Box<Prop>, Box<Prop>),
}

impl Prop {
    pub fn implies(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, q) => q,
            (_, Self::True) => Self::True,
            (p, q) => Self::Implies(Box::new(p), Box::new(q)),
        }
    }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, q) => q,
            (p, Self::True) => p,
            (Self::And(mut ps), q) => {
                ps.push(q);
                Self::And(ps)
            }
            (p, q) => Self::And(alloc::vec![p, q]),
        }
    }
}

/// Assignment of atoms to expressions.
#[derive(Default)]
pub struct Atoms(FnvHashMap<String, usize>);

impl Atoms {
    pub fn atom(&mut self, e: &Expr) -> Prop {
        if e.is_contradiction() {
            return Prop::False;
        }
        let len = self.0.len();
        Prop::Atom(*self.0.entry(e.canonical()).or_insert(len))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Literals are nonzero integers, negative for negated variables.
type Lit = i32;

struct Cnf {
    clauses: Vec<Vec<Lit>>,
    vars: usize,
}

impl Cnf {
    fn new(atoms: usize) -> Self {
        Self {
            clauses: Vec::new(),
            vars: atoms,
        }
    }

    fn fresh(&mut self) -> Lit {
        self.vars += 1;
        self.vars as Lit
    }

    /// Return a literal equivalent to the proposition.
    fn encode(&mut self, p: &Prop) -> Lit {
        match p {
            Prop::True => {
                let x = self.fresh();
                self.clauses.push(alloc::vec![x]);
                x
            }
            Prop::False => {
                let x = self.fresh();
                self.clauses.push(alloc::vec![-x]);
                x
            }
            Prop::Atom(a) => *a as Lit + 1,
            Prop::And(ps) => {
                let lits: Vec<_> = ps.iter().map(|p| self.encode(p)).collect();
                let x = self.fresh();
                let mut all = alloc::vec![x];
                for l in lits {
                    self.clauses.push(alloc::vec![-x, l]);
                    all.push(-l);
                }
                self.clauses.push(all);
                x
            }
            Prop::Implies(p, q) => {
                let (p, q) = (self.encode(p), self.encode(q));
                let x = self.fresh();
                self.clauses.push(alloc::vec![-x, -p, q]);
                self.clauses.push(alloc::vec![x, p]);
                self.clauses.push(alloc::vec![x, -q]);
                x
            }
        }
    }

    fn satisfiable(&self) -> bool {
        let mut assignment = alloc::vec![0i8; self.vars + 1];
        dpll(&self.clauses, &mut assignment)
    }
}

fn value(assignment: &[i8], l: Lit) -> i8 {
    let v = assignment[l.unsigned_abs() as usize];
    if l > 0 {
        v
    } else {
        -v
    }
}

/// Assign unit literals until a fixpoint, returning false on conflict.
fn propagate(clauses: &[Vec<Lit>], assignment: &mut [i8], trail: &mut Vec<usize>) -> bool {
    loop {
        let mut changed = false;
        for clause in clauses {
            let mut unassigned = None;
            let mut open = 0;
            let mut satisfied = false;
            for l in clause {
                match value(assignment, *l) {
                    1 => {
                        satisfied = true;
                        break;
                    }
                    0 => {
                        open += 1;
                        unassigned = Some(*l)
                    }
                    _ => (),
                }
            }
            if satisfied {
                continue;
            }
            match (open, unassigned) {
                (0, _) => return false,
                (1, Some(l)) => {
                    let var = l.unsigned_abs() as usize;
                    assignment[var] = if l > 0 { 1 } else { -1 };
                    trail.push(var);
                    changed = true
                }
                _ => (),
            }
        }
        if !changed {
            return true;
        }
    }
}

fn dpll(clauses: &[Vec<Lit>], assignment: &mut [i8]) -> bool {
    let mut trail = Vec::new();
    let undo = |assignment: &mut [i8], trail: &[usize]| trail.iter().for_each(|v| assignment[*v] = 0);

    if !propagate(clauses, assignment, &mut trail) {
        undo(assignment, &trail);
        return false;
    }
    // branch on a literal of the first clause not yet satisfied
    let open = clauses.iter().find(|c| !c.iter().any(|l| value(assignment, *l) == 1));
    let lit = match open.and_then(|c| c.iter().find(|l| value(assignment, **l) == 0)) {
        Some(l) => *l,
        None => {
            let sat = open.is_none();
            if !sat {
                undo(assignment, &trail);
            }
            return sat;
        }
    };
    let var = lit.unsigned_abs() as usize;
    for choice in [lit.signum() as i8, -lit.signum() as i8] {
        assignment[var] = choice;
        if dpll(clauses, assignment) {
            return true;
        }
        assignment[var] = 0;
    }
    undo(assignment, &trail);
    false
}

/// Return true if the premises classically entail the goal.
pub fn entails(atoms: usize, premises: &[Prop], goal: &Prop) -> bool {
    let mut cnf = Cnf::new(atoms);
    for p in premises {
        let l = cnf.encode(p);
        cnf.clauses.push(alloc::vec![l]);
    }
    let g = cnf.encode(goal);
    cnf.clauses.push(alloc::vec![-g]);
    !cnf.satisfiable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Prop::*;

    fn imp(p: Prop, q: Prop) -> Prop {
        p.implies(q)
    }

    #[test]
    fn modus_ponens() {
        let (p, q) = (Atom(0), Atom(1));
        assert!(entails(2, &[p.clone(), imp(p.clone(), q.clone())], &q));
        assert!(!entails(2, &[imp(p.clone(), q.clone())], &q));
        assert!(!entails(2, &[q.clone()], &p));
    }

    #[test]
    fn conjunction() {
        let (p, q) = (Atom(0), Atom(1));
        let pq = p.clone().and(q.clone());
        assert!(entails(2, &[pq.clone()], &q));
        assert!(entails(2, &[p.clone(), q.clone()], &pq));
        assert!(!entails(2, &[p.clone()], &pq));
    }

    #[test]
    fn contradiction() {
        let p = Atom(0);
        assert!(entails(1, &[False], &p));
        assert!(entails(1, &[p.clone(), imp(p.clone(), False)], &False));
        assert!(!entails(1, &[p.clone()], &False));
        assert!(entails(0, &[], &True));
        assert!(entails(1, &[], &imp(p.clone(), p)));
    }

    #[test]
    fn atoms() {
        use crate::expr::parse_expr;
        let mut atoms = Atoms::default();
        let a = atoms.atom(&parse_expr("(∀ x , (P x))"));
        let b = atoms.atom(&parse_expr("(∀ y , (P y))"));
        assert_eq!(a, b);
        assert_eq!(atoms.atom(&parse_expr("→←")), False);
        assert_eq!(atoms.len(), 1);
    }
}
