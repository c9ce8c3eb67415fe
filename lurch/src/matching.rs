//! Matching of patterns against expressions.
//!
//! A pattern is an expression some of whose free symbols are metavariables.
//! Matching a pattern against an expression yields all substitutions
//! of the metavariables that make the pattern equal to the expression,
//! up to renaming of bound variables.
//!
//! Expression function applications `(@ P t)` whose operator `P` is a
//! metavariable are solved by abstraction: `P` becomes a lambda
//! abstracting all occurrences of `t` in the expression,
//! or a lambda ignoring its argument.

use crate::expr::EFA;
use crate::{Expr, Stack, Subst};
use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Pairs of variables bound in the pattern and in the expression.
type Bound = Stack<(String, String)>;

pub struct Matcher<'a> {
    metavars: &'a BTreeSet<String>,
}

impl<'a> Matcher<'a> {
    pub fn new(metavars: &'a BTreeSet<String>) -> Self {
        Self { metavars }
    }

    pub fn is_metavar(&self, x: &str) -> bool {
        self.metavars.contains(x)
    }

    /// Return all extensions of `subst` under which the pattern matches the expression.
    pub fn matches(&self, pat: &Expr, expr: &Expr, subst: Subst) -> Vec<Subst> {
        self.go(pat, expr, subst, &mut Bound::new())
    }

    fn go(&self, pat: &Expr, expr: &Expr, subst: Subst, bnd: &mut Bound) -> Vec<Subst> {
        match pat {
            Expr::Symbol(x) => self.symbol(x, expr, subst, bnd).into_iter().collect(),
            Expr::Number(n) => match expr {
                Expr::Number(m) if m == n => alloc::vec![subst],
                _ => Vec::new(),
            },
            Expr::Apply(items) => {
                if let Some((f, args)) = self.efa(items, bnd) {
                    return self.efa_matches(f, args, expr, subst, bnd);
                }
                match expr {
                    Expr::Apply(items2) if items.len() == items2.len() => {
                        let mut substs = alloc::vec![subst];
                        for (p, e) in items.iter().zip(items2) {
                            let next = substs.into_iter().flat_map(|s| self.go(p, e, s, bnd));
                            substs = next.collect();
                            if substs.is_empty() {
                                break;
                            }
                        }
                        substs
                    }
                    _ => Vec::new(),
                }
            }
            Expr::Bind(head, vars, body) => match expr {
                Expr::Bind(head2, vars2, body2) if vars.len() == vars2.len() => {
                    let mut out = Vec::new();
                    for s in self.go(head, head2, subst, bnd) {
                        let pairs = vars.iter().cloned().zip(vars2.iter().cloned());
                        out.extend(bnd.with_pushed(pairs, |bnd| self.go(body, body2, s, bnd)));
                    }
                    out
                }
                _ => Vec::new(),
            },
        }
    }

    fn symbol(&self, x: &String, expr: &Expr, subst: Subst, bnd: &Bound) -> Option<Subst> {
        let bound_in_expr = |y: &String| bnd.position(|(_, e)| e == y);

        // variable bound in the pattern
        if let Some(i) = bnd.position(|(p, _)| p == x) {
            return match expr {
                Expr::Symbol(y) if bound_in_expr(y) == Some(i) => Some(subst),
                _ => None,
            };
        }

        if self.is_metavar(x) {
            // metavariables must not capture variables bound in the expression
            if bnd.iter().any(|(_, y)| expr.has_free(y)) {
                return None;
            }
            return match subst.get(x).map(|old| old.alpha_eq(expr)) {
                Some(true) => Some(subst),
                Some(false) => None,
                None => Some(subst.update(x.clone(), expr.clone())),
            };
        }

        match expr {
            Expr::Symbol(y) if y == x && bound_in_expr(y).is_none() => Some(subst),
            _ => None,
        }
    }

    /// Return operator and arguments of an expression function application
    /// whose operator is a metavariable.
    fn efa<'e>(&self, items: &'e [Expr], bnd: &Bound) -> Option<(&'e String, &'e [Expr])> {
        let (head, rest) = items.split_first()?;
        if head.get_symbol() != Some(EFA) {
            return None;
        }
        match rest.split_first()? {
            (Expr::Symbol(f), args) if self.is_metavar(f) && bnd.position(|(p, _)| p == f).is_none() => {
                Some((f, args))
            }
            _ => None,
        }
    }

    fn efa_matches(&self, f: &String, args: &[Expr], expr: &Expr, subst: Subst, bnd: &mut Bound) -> Vec<Subst> {
        if let Some(op) = subst.get(f).cloned() {
            let items = [Expr::symbol(EFA), op].into_iter().chain(args.iter().cloned());
            let reduced = Expr::Apply(items.collect()).beta();
            return self.go(&reduced, expr, subst, bnd);
        }

        let bound: &Bound = bnd;
        let images: Option<Vec<Expr>> = args.iter().map(|a| self.image(a, &subst, bound)).collect();
        let images = match images {
            Some(images) => images,
            None => return Vec::new(),
        };

        let vars: Vec<String> = fresh_vars(images.len(), expr);
        let body = images
            .iter()
            .zip(&vars)
            .fold(expr.clone(), |body, (t, v)| abstract_term(&body, t, v));

        let mut solutions = Vec::new();
        for body in [body, expr.clone()] {
            // the operator must not refer to variables bound in the expression
            if bnd.iter().any(|(_, y)| body.has_free(y)) {
                continue;
            }
            let op = Expr::lambda(vars.clone(), body);
            if !solutions.iter().any(|s: &Subst| s.get(f) == Some(&op)) {
                solutions.push(subst.update(f.clone(), op));
            }
        }
        solutions
    }

    /// Return the expression that an argument of an expression function application stands for.
    ///
    /// This is `None` if the argument contains metavariables without value.
    fn image(&self, arg: &Expr, subst: &Subst, bnd: &Bound) -> Option<Expr> {
        if let Some(x) = arg.get_symbol() {
            if let Some(i) = bnd.position(|(p, _)| p == x) {
                return bnd.iter().nth(i).map(|(_, e)| Expr::symbol(e.clone()));
            }
        }
        let free = arg.free_symbols();
        let unknown = |x: &String| self.is_metavar(x) && !subst.contains_key(x);
        let bound = |x: &String| bnd.position(|(p, _)| p == x).is_some();
        if free.iter().any(|x| unknown(x) || bound(x)) {
            None
        } else {
            Some(arg.subst(subst))
        }
    }
}

/// Return true if the name occurs anywhere in the expression, bound or free.
fn occurs(e: &Expr, name: &str) -> bool {
    match e {
        Expr::Symbol(s) => s == name,
        Expr::Number(_) => false,
        Expr::Apply(items) => items.iter().any(|i| occurs(i, name)),
        Expr::Bind(head, vars, body) => {
            vars.iter().any(|v| v == name) || occurs(head, name) || occurs(body, name)
        }
    }
}

fn fresh_vars(n: usize, e: &Expr) -> Vec<String> {
    (0..)
        .map(|i| format!("v{}", i))
        .filter(|v| !occurs(e, v))
        .take(n)
        .collect()
}

/// Replace all occurrences of `t` in `e` by the variable `v`,
/// except where a free variable of `t` is bound inside `e`.
fn abstract_term(e: &Expr, t: &Expr, v: &str) -> Expr {
    if e == t {
        return Expr::symbol(v);
    }
    match e {
        Expr::Apply(items) => Expr::Apply(items.iter().map(|i| abstract_term(i, t, v)).collect()),
        Expr::Bind(head, vars, body) => {
            let head = Box::new(abstract_term(head, t, v));
            if vars.iter().any(|x| t.has_free(x)) {
                Expr::Bind(head, vars.clone(), body.clone())
            } else {
                Expr::Bind(head, vars.clone(), Box::new(abstract_term(body, t, v)))
            }
        }
        Expr::Symbol(_) | Expr::Number(_) => e.clone(),
    }
}
