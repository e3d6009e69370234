/// Creates a single [`Message`](crate::Message) from a sender shorthand.
///
/// ```rust
/// use parley::{Sender, parley_msg};
///
/// let message = parley_msg!(user, "s1", "srv-3" => "Where is my order?");
/// assert_eq!(message.sender, Sender::User);
/// assert_eq!(message.id.as_str(), "srv-3");
/// ```
#[macro_export]
macro_rules! parley_msg {
    (user, $session_id:expr, $id:expr => $content:expr $(,)?) => {
        $crate::Message::new($id, $session_id, $crate::Sender::User, $content)
            .with_status($crate::MessageStatus::Delivered)
    };
    (support, $session_id:expr, $id:expr => $content:expr $(,)?) => {
        $crate::Message::new($id, $session_id, $crate::Sender::Support, $content)
            .with_status($crate::MessageStatus::Delivered)
    };
    ($sender:ident, $session_id:expr, $id:expr => $content:expr $(,)?) => {
        compile_error!("unsupported sender: use user or support");
    };
}

/// Creates an oldest-first `Vec<Message>` for one session, handy for seeding history.
///
/// ```rust
/// use parley::{InMemoryTransport, parley_history};
///
/// let transport = InMemoryTransport::new();
/// transport.seed_history("s1", parley_history!("s1";
///     support "srv-1" => "Hi, how can we help?",
///     user "srv-2" => "I need a refund.",
/// ));
///
/// assert_eq!(transport.history("s1").len(), 2);
/// ```
#[macro_export]
macro_rules! parley_history {
    ($session_id:expr $(;)?) => {
        Vec::<$crate::Message>::new()
    };
    ($session_id:expr; $($sender:ident $id:expr => $content:expr),+ $(,)?) => {
        vec![$($crate::parley_msg!($sender, $session_id, $id => $content)),+]
    };
}

/// Creates an active [`ChatSession`](crate::ChatSession) with priority shorthand and tags.
///
/// ```rust
/// use parley::{SessionPriority, parley_session};
///
/// let session = parley_session!("s1", high);
/// assert_eq!(session.priority, SessionPriority::High);
/// ```
#[macro_export]
macro_rules! parley_session {
    (@tags $session:expr $(, $tag:expr)*) => {
        $session $(.with_tag($tag))*
    };
    ($session_id:expr $(,)?) => {
        $crate::ChatSession::new($session_id)
    };
    ($session_id:expr, low $(, [$($tag:expr),* $(,)?])? $(,)?) => {
        $crate::parley_session!(@tags $crate::ChatSession::new($session_id)
            .with_priority($crate::SessionPriority::Low) $(, $($tag),*)?)
    };
    ($session_id:expr, normal $(, [$($tag:expr),* $(,)?])? $(,)?) => {
        $crate::parley_session!(@tags $crate::ChatSession::new($session_id)
            .with_priority($crate::SessionPriority::Normal) $(, $($tag),*)?)
    };
    ($session_id:expr, high $(, [$($tag:expr),* $(,)?])? $(,)?) => {
        $crate::parley_session!(@tags $crate::ChatSession::new($session_id)
            .with_priority($crate::SessionPriority::High) $(, $($tag),*)?)
    };
    ($session_id:expr, urgent $(, [$($tag:expr),* $(,)?])? $(,)?) => {
        $crate::parley_session!(@tags $crate::ChatSession::new($session_id)
            .with_priority($crate::SessionPriority::Urgent) $(, $($tag),*)?)
    };
}
