/// The call stack of return addresses.
///
/// Depth is not limited. Popping an empty stack yields `None` and
/// leaves the stack as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    frames: Vec<u16>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: u16) {
        self.frames.push(address);
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.frames.pop()
    }

    pub fn peek(&self) -> Option<u16> {
        self.frames.last().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Stack;

    #[test]
    fn test_lifo() {
        let mut stack = Stack::new();
        stack.push(0x202);
        stack.push(0x304);
        assert_eq!(stack.peek(), Some(0x304));
        assert_eq!(stack.pop(), Some(0x304));
        assert_eq!(stack.pop(), Some(0x202));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_empty_pop() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.len(), 0);
    }
}
