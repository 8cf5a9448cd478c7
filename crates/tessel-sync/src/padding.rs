//! Fixed codecs for formatting, padding wrappers and marker sets.
//!
//! These shapes are shared by every language, so unlike nodes they are not
//! looked up in the registry.

use std::sync::Arc;

use tessel_tree::{Comment, Container, LeftPadded, Marker, Markers, NodeId, RightPadded, Same, Space};

use crate::{ReceiveQueue, SendQueue, SyncResult};

impl SendQueue<'_> {
    /// Writes a space whole: whitespace, then each comment.
    #[track_caller]
    pub fn send_space(&mut self, space: &Space) {
        self.send_str(&space.whitespace);
        self.send_len(space.comments.len());
        for comment in &space.comments {
            self.send_str(&comment.text);
            self.send_bool(comment.multiline);
            self.send_str(&comment.suffix);
        }
    }

    #[track_caller]
    pub fn get_and_send_space(&mut self, after: &Space, before: Option<&Space>) -> SyncResult<()> {
        self.get_and_send_value(after, before)
    }

    /// Writes one marker: kind tag and id, then the registered codec's fields.
    #[track_caller]
    pub fn send_marker(&mut self, marker: &Arc<dyn Marker>) -> SyncResult<()> {
        self.send_str(marker.kind());
        self.send_id(marker.id());
        let registry = self.registry();
        registry.dispatch_send_marker(&**marker, self)
    }

    /// Writes a marker set as its id and the list of markers, keyed by marker id.
    #[track_caller]
    pub fn send_markers(&mut self, after: &Markers, before: Option<&Markers>) -> SyncResult<()> {
        self.send_id(after.id);
        self.get_and_send_list(
            &after.entries,
            before.map(|before| before.entries.as_slice()),
            |marker| marker.id(),
            |q, marker, _| q.send_marker(marker),
        )
    }

    #[track_caller]
    pub fn get_and_send_markers(&mut self, after: &Markers, before: Option<&Markers>) -> SyncResult<()> {
        self.get_and_send(after, before, Self::send_markers)
    }

    /// Writes the fields of a left-padded element; `encode` writes the
    /// element's payload once its change marker is out.
    #[track_caller]
    pub fn send_left_padded<T: Same>(
        &mut self,
        after: &LeftPadded<T>,
        before: Option<&LeftPadded<T>>,
        encode: impl FnOnce(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        self.get_and_send_space(&after.before, before.map(|before| &before.before))?;
        self.get_and_send(&after.element, before.map(|before| &before.element), encode)?;
        self.get_and_send_markers(&after.markers, before.map(|before| &before.markers))
    }

    #[track_caller]
    pub fn send_right_padded<T: Same>(
        &mut self,
        after: &RightPadded<T>,
        before: Option<&RightPadded<T>>,
        encode: impl FnOnce(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        self.get_and_send(&after.element, before.map(|before| &before.element), encode)?;
        self.get_and_send_space(&after.after, before.map(|before| &before.after))?;
        self.get_and_send_markers(&after.markers, before.map(|before| &before.markers))
    }

    /// Writes the fields of a container. Elements are diffed as a list keyed
    /// by `identify`.
    #[track_caller]
    pub fn send_container<T: Same>(
        &mut self,
        after: &Container<T>,
        before: Option<&Container<T>>,
        identify: impl Fn(&T) -> NodeId,
        mut encode: impl FnMut(&mut Self, &T, Option<&T>) -> SyncResult<()>,
    ) -> SyncResult<()> {
        self.get_and_send_space(&after.before, before.map(|before| &before.before))?;
        self.get_and_send_list(
            &after.elements,
            before.map(|before| before.elements.as_slice()),
            |padded| identify(&padded.element),
            |q, after, before| q.send_right_padded(after, before, &mut encode),
        )?;
        self.get_and_send_markers(&after.markers, before.map(|before| &before.markers))
    }
}

impl ReceiveQueue<'_> {
    pub fn decode_space(&mut self) -> SyncResult<Space> {
        let whitespace = self.decode_string()?;
        let len = self.decode_len()?;
        let mut comments = Vec::new();
        for _ in 0..len {
            let text = self.decode_string()?;
            let multiline = self.decode_bool()?;
            let suffix = self.decode_string()?;
            comments.push(Comment { text, multiline, suffix });
        }
        Ok(Space { whitespace, comments })
    }

    pub fn receive_space(&mut self, before: Option<&Space>) -> SyncResult<Space> {
        self.receive_value(before)
    }

    pub fn decode_marker(&mut self) -> SyncResult<Arc<dyn Marker>> {
        let tag = self.decode_str()?;
        let id = self.decode_id()?;
        let registry = self.registry();
        registry.dispatch_receive_marker(&tag, id, self)
    }

    pub fn decode_markers(&mut self, before: Option<&Markers>) -> SyncResult<Markers> {
        let id = self.decode_id()?;
        let entries = self.receive_list(before.map(|before| before.entries.as_slice()), |q, _| {
            q.decode_marker()
        })?;
        Ok(Markers { id, entries })
    }

    pub fn receive_markers(&mut self, before: Option<&Markers>) -> SyncResult<Markers> {
        self.receive(before, Self::decode_markers)
    }

    pub fn decode_left_padded<T: Clone>(
        &mut self,
        before: Option<&LeftPadded<T>>,
        decode: impl FnOnce(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<LeftPadded<T>> {
        let space = self.receive_space(before.map(|before| &before.before))?;
        let element = self.receive(before.map(|before| &before.element), decode)?;
        let markers = self.receive_markers(before.map(|before| &before.markers))?;
        Ok(LeftPadded { before: space, element, markers })
    }

    pub fn decode_right_padded<T: Clone>(
        &mut self,
        before: Option<&RightPadded<T>>,
        decode: impl FnOnce(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<RightPadded<T>> {
        let element = self.receive(before.map(|before| &before.element), decode)?;
        let after = self.receive_space(before.map(|before| &before.after))?;
        let markers = self.receive_markers(before.map(|before| &before.markers))?;
        Ok(RightPadded { element, after, markers })
    }

    pub fn decode_container<T: Clone>(
        &mut self,
        before: Option<&Container<T>>,
        mut decode: impl FnMut(&mut Self, Option<&T>) -> SyncResult<T>,
    ) -> SyncResult<Container<T>> {
        let space = self.receive_space(before.map(|before| &before.before))?;
        let elements = self.receive_list(
            before.map(|before| before.elements.as_slice()),
            |q, before| q.decode_right_padded(before, &mut decode),
        )?;
        let markers = self.receive_markers(before.map(|before| &before.markers))?;
        Ok(Container { before: space, elements, markers })
    }
}
