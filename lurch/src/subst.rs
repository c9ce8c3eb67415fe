//! Capture-avoiding substitution and beta reduction.

use crate::expr::EFA;
use crate::Expr;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Map from metavariables to expressions.
///
/// Partial substitutions are cloned often during matching,
/// which is cheap for persistent maps.
pub type Subst = im::OrdMap<String, Expr>;

/// Return a variant of `base` that does not satisfy `taken`.
fn fresh(base: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|i| format!("{}{}", base, i))
        .find(|name| !taken(name.as_str()))
        .unwrap_or_else(|| String::from(base))
}

impl Expr {
    /// Replace free symbols simultaneously, renaming bound variables
    /// that would capture symbols of the replacements.
    pub fn subst(&self, s: &Subst) -> Expr {
        if s.is_empty() {
            return self.clone();
        }
        match self {
            Self::Symbol(x) => s.get(x).cloned().unwrap_or_else(|| self.clone()),
            Self::Number(_) => self.clone(),
            Self::Apply(items) => Self::Apply(items.iter().map(|i| i.subst(s)).collect()),
            Self::Bind(head, vars, body) => {
                let inner: Subst = s
                    .iter()
                    .filter(|(k, _)| !vars.contains(*k) && body.has_free(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let captured = |x: &str| inner.values().any(|e| e.has_free(x));
                let taken = |x: &str| {
                    captured(x) || inner.contains_key(x) || body.has_free(x) || vars.iter().any(|v| v == x)
                };

                let mut renaming = Subst::new();
                let vars: Vec<String> = vars
                    .iter()
                    .map(|v| {
                        if captured(v.as_str()) {
                            let v2 = fresh(v, |x| taken(x) || renaming.values().any(|e| e.has_free(x)));
                            renaming.insert(v.clone(), Self::symbol(v2.clone()));
                            v2
                        } else {
                            v.clone()
                        }
                    })
                    .collect();
                let body = body.subst(&renaming).subst(&inner);
                Self::Bind(Box::new(head.subst(s)), vars, Box::new(body))
            }
        }
    }

    /// Reduce all applications `(@ (𝜆 x , b) t)` of lambda abstractions to `b[x := t]`.
    pub fn beta(&self) -> Expr {
        match self {
            Self::Apply(items) => {
                let items: Vec<_> = items.iter().map(Self::beta).collect();
                beta_redex(&items).unwrap_or(Self::Apply(items))
            }
            Self::Bind(head, vars, body) => {
                Self::Bind(Box::new(head.beta()), vars.clone(), Box::new(body.beta()))
            }
            Self::Symbol(_) | Self::Number(_) => self.clone(),
        }
    }
}

fn beta_redex(items: &[Expr]) -> Option<Expr> {
    let (f, args) = items.split_first().filter(|(h, _)| h.get_symbol() == Some(EFA))?.1.split_first()?;
    let (vars, body) = f.get_lambda()?;
    if vars.len() != args.len() {
        return None;
    }
    let s: Subst = vars.iter().cloned().zip(args.iter().cloned()).collect();
    Some(body.subst(&s).beta())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expr;

    fn subst(pairs: &[(&str, &str)]) -> Subst {
        pairs
            .iter()
            .map(|(x, e)| (String::from(*x), parse_expr(e)))
            .collect()
    }

    #[test]
    fn capture() {
        let e = parse_expr("(∀ y , (P x y))");
        let s = subst(&[("x", "y")]);
        assert_eq!(e.subst(&s), parse_expr("(∀ y1 , (P y y1))"));

        let e = parse_expr("(and x (∀ x , (P x)))");
        let s = subst(&[("x", "a")]);
        assert_eq!(e.subst(&s), parse_expr("(and a (∀ x , (P x)))"));
    }

    #[test]
    fn simultaneous() {
        let e = parse_expr("(f x y)");
        let s = subst(&[("x", "y"), ("y", "x")]);
        assert_eq!(e.subst(&s), parse_expr("(f y x)"));
    }

    #[test]
    fn beta() {
        let e = parse_expr("(@ (λ x , (f x x)) (g a))");
        assert_eq!(e.beta(), parse_expr("(f (g a) (g a))"));

        let e = parse_expr("(@ P a)");
        let s = subst(&[("P", "(𝜆 v , (∀ a , (Q v a)))")]);
        assert_eq!(e.subst(&s).beta(), parse_expr("(∀ a1 , (Q a a1))"));
    }
}
