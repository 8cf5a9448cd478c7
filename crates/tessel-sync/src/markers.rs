//! Codecs of the marker kinds every registry knows.

use tessel_tree::{Markup, MarkupLevel, NodeId, SearchResult};

use crate::{CodecRegistry, ReceiveQueue, SendQueue, SyncResult};

pub(crate) fn register(registry: &CodecRegistry) {
    registry.register_marker(send_search_result, receive_search_result);
    registry.register_marker(send_markup, receive_markup);
}

fn send_optional_str(q: &mut SendQueue<'_>, value: Option<&str>) {
    q.send_bool(value.is_some());
    if let Some(value) = value {
        q.send_str(value);
    }
}

fn receive_optional_string(q: &mut ReceiveQueue<'_>) -> SyncResult<Option<String>> {
    if q.decode_bool()? { q.decode_string().map(Some) } else { Ok(None) }
}

fn send_search_result(marker: &SearchResult, q: &mut SendQueue<'_>) -> SyncResult<()> {
    send_optional_str(q, marker.description.as_deref());
    Ok(())
}

fn receive_search_result(id: NodeId, q: &mut ReceiveQueue<'_>) -> SyncResult<SearchResult> {
    Ok(SearchResult { id, description: receive_optional_string(q)? })
}

fn send_markup(marker: &Markup, q: &mut SendQueue<'_>) -> SyncResult<()> {
    q.send_int(marker.level as i64);
    q.send_str(&marker.message);
    send_optional_str(q, marker.detail.as_deref());
    Ok(())
}

fn receive_markup(id: NodeId, q: &mut ReceiveQueue<'_>) -> SyncResult<Markup> {
    let level = q.decode_enum("markup level", &MarkupLevel::ALL)?;
    let message = q.decode_string()?;
    let detail = receive_optional_string(q)?;
    Ok(Markup { id, level, message, detail })
}
