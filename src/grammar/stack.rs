//! The symbol stack both interpreters drive.

use super::Symbol;

#[derive(Debug)]
pub struct SymbolStack {
    stack: Vec<Symbol>,
}

impl SymbolStack {
    pub fn new(root: Symbol) -> Self {
        Self { stack: vec![root] }
    }

    pub fn pop(&mut self) -> Option<Symbol> {
        self.stack.pop()
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.stack.push(symbol);
    }

    pub fn top(&self) -> Option<&Symbol> {
        self.stack.last()
    }

    /// Stack depth; 1 means the interpreter is still at the outermost symbol.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Expands a non-terminal in place. Sequences push their production
    /// reversed so the first symbol ends on top; a repeater re-pushes itself
    /// below its body so containers iterate until the end symbol matches.
    pub fn push_production(&mut self, symbol: &Symbol) {
        match symbol {
            Symbol::Sequence(production) => {
                for sym in production.iter().rev() {
                    self.stack.push(sym.clone());
                }
            }
            Symbol::Repeater { body, .. } => {
                self.stack.push(symbol.clone());
                for sym in body.iter().rev() {
                    self.stack.push(sym.clone());
                }
            }
            other => self.stack.push(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::root_symbol;
    use crate::schema::Schema;

    #[test]
    fn repeater_keeps_itself_below_its_body() {
        let root = root_symbol(&Schema::Array(Box::new(Schema::Int)));
        let mut stack = SymbolStack::new(root);

        let seq = stack.pop().unwrap();
        stack.push_production(&seq);
        assert_eq!(stack.top(), Some(&Symbol::ArrayStart));
        stack.pop();

        let repeater = stack.pop().unwrap();
        stack.push_production(&repeater);
        assert_eq!(stack.pop(), Some(Symbol::Int));
        assert_eq!(stack.pop(), Some(Symbol::ItemEnd));
        assert!(matches!(stack.pop(), Some(Symbol::Repeater { .. })));
        assert_eq!(stack.depth(), 0);
    }
}
