/// Pointer interaction on a body row. A double click arrives as its own event so callers
/// can tell the two apart.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowEvent {
    Click,
    DoubleClick,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Handled {
    Yes,
    No,
}

/// Caller hooks for row interaction. Every method has a default so implementors only
/// override what they need.
pub trait RowHandler<R> {
    fn on_row_click(&mut self, row: &R) {
        let _ = row;
    }

    /// Returning [`Handled::No`] lets the table toggle the row's selection.
    fn on_double_click(&mut self, row: &R) -> Handled {
        let _ = row;
        Handled::No
    }
}

impl<R> RowHandler<R> for () {}
