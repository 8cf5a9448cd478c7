use crate::{Markers, Same, Space};

/// An element preceded by formatting, e.g. the `= value` of an assignment.
#[derive(Clone, Debug)]
pub struct LeftPadded<T> {
    pub before: Space,
    pub element: T,
    pub markers: Markers,
}

impl<T> LeftPadded<T> {
    pub fn new(before: Space, element: T) -> Self {
        Self { before, element, markers: Markers::empty() }
    }

    pub fn with_element(self, element: T) -> Self {
        Self { element, ..self }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LeftPadded<U> {
        LeftPadded { before: self.before, element: f(self.element), markers: self.markers }
    }
}

/// An element followed by formatting, e.g. an argument before its comma.
#[derive(Clone, Debug)]
pub struct RightPadded<T> {
    pub element: T,
    pub after: Space,
    pub markers: Markers,
}

impl<T> RightPadded<T> {
    pub fn new(element: T, after: Space) -> Self {
        Self { element, after, markers: Markers::empty() }
    }

    pub fn with_element(self, element: T) -> Self {
        Self { element, ..self }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RightPadded<U> {
        RightPadded { element: f(self.element), after: self.after, markers: self.markers }
    }
}

/// A delimited sequence such as an argument list: the space before the
/// opening delimiter, then each element with the space before its separator.
#[derive(Clone, Debug)]
pub struct Container<T> {
    pub before: Space,
    pub elements: Vec<RightPadded<T>>,
    pub markers: Markers,
}

impl<T> Container<T> {
    pub fn new(before: Space, elements: Vec<RightPadded<T>>) -> Self {
        Self { before, elements, markers: Markers::empty() }
    }

    pub fn empty() -> Self {
        Self::new(Space::EMPTY, Vec::new())
    }

    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.elements.iter().map(|padded| &padded.element)
    }

    pub fn with_elements(self, elements: Vec<RightPadded<T>>) -> Self {
        Self { elements, ..self }
    }
}

impl<T: Same> Same for LeftPadded<T> {
    fn same(&self, before: &Self) -> bool {
        self.element.same(&before.element)
            && self.before == before.before
            && self.markers.same(&before.markers)
    }
}

impl<T: Same> Same for RightPadded<T> {
    fn same(&self, before: &Self) -> bool {
        self.element.same(&before.element)
            && self.after == before.after
            && self.markers.same(&before.markers)
    }
}

impl<T: Same> Same for Container<T> {
    fn same(&self, before: &Self) -> bool {
        self.before == before.before
            && self.elements.same(&before.elements)
            && self.markers.same(&before.markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_compares_space_independently_of_element() {
        let padded = RightPadded::new(1_i64, Space::whitespace(" "));
        let same = padded.clone();
        assert!(padded.same(&same));

        let reformatted = RightPadded { after: Space::whitespace("  "), ..padded.clone() };
        assert!(!reformatted.same(&padded));

        let changed = padded.clone().with_element(2);
        assert!(!changed.same(&padded));
    }

    #[test]
    fn container_elements() {
        let container = Container::new(
            Space::EMPTY,
            vec![RightPadded::new("a".to_owned(), Space::EMPTY), RightPadded::new("b".to_owned(), Space::EMPTY)],
        );
        assert_eq!(container.elements().cloned().collect::<Vec<_>>(), ["a", "b"]);
        assert!(container.same(&container.clone()));
        assert!(!container.same(&Container::empty()));
    }
}
