//! Boolean operator overloads for [`Formula`]

use std::ops::{BitAnd, BitOr, Not};

use super::{And, Formula, Neg, Or};

impl Not for Formula {
    type Output = Formula;

    fn not(self) -> Self::Output {
        Neg { arg: Box::new(self) }.into()
    }
}

impl Not for Box<Formula> {
    type Output = Formula;

    fn not(self) -> Self::Output {
        Neg { arg: self }.into()
    }
}

impl BitAnd for Formula {
    type Output = Formula;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Formula::And(And { args: mut left }), Formula::And(And { args: mut right })) => {
                left.append(&mut right);
                And { args: left }.into()
            }
            (Formula::And(And { mut args }), other) => {
                args.push(other);
                And { args }.into()
            }
            (other, Formula::And(And { mut args })) => {
                args.insert(0, other);
                And { args }.into()
            }
            (left, right) => And { args: vec![left, right] }.into(),
        }
    }
}

impl BitOr for Formula {
    type Output = Formula;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Formula::Or(Or { args: mut left }), Formula::Or(Or { args: mut right })) => {
                left.append(&mut right);
                Or { args: left }.into()
            }
            (Formula::Or(Or { mut args }), other) => {
                args.push(other);
                Or { args }.into()
            }
            (other, Formula::Or(Or { mut args })) => {
                args.insert(0, other);
                Or { args }.into()
            }
            (left, right) => Or { args: vec![left, right] }.into(),
        }
    }
}
