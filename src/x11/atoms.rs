//! Interned atoms used by the host window.
//!
//! Only the ICCCM/EWMH names the window actually reads or writes are
//! interned; predefined atoms come from `AtomEnum`.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt};

use crate::error::Result;

/// Holds the atoms a host window needs
#[derive(Debug, Clone)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_ping: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub xdnd_proxy: Atom,
    // Predefined
    pub atom: Atom,
    pub cardinal: Atom,
    pub window: Atom,
    pub string: Atom,
    pub wm_name: Atom,
    pub wm_client_machine: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        // Send every request before waiting on the first reply
        let names: [&[u8]; 9] = [
            b"WM_PROTOCOLS",
            b"WM_DELETE_WINDOW",
            b"_NET_WM_PID",
            b"_NET_WM_PING",
            b"_NET_WM_STATE",
            b"_NET_WM_STATE_ABOVE",
            b"_NET_WM_NAME",
            b"UTF8_STRING",
            b"XdndProxy",
        ];
        let cookies = names
            .iter()
            .map(|name| conn.intern_atom(false, name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut interned = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            interned.push(cookie.reply()?.atom);
        }

        Ok(Self {
            wm_protocols: interned[0],
            wm_delete_window: interned[1],
            net_wm_pid: interned[2],
            net_wm_ping: interned[3],
            net_wm_state: interned[4],
            net_wm_state_above: interned[5],
            net_wm_name: interned[6],
            utf8_string: interned[7],
            xdnd_proxy: interned[8],
            atom: AtomEnum::ATOM.into(),
            cardinal: AtomEnum::CARDINAL.into(),
            window: AtomEnum::WINDOW.into(),
            string: AtomEnum::STRING.into(),
            wm_name: AtomEnum::WM_NAME.into(),
            wm_client_machine: AtomEnum::WM_CLIENT_MACHINE.into(),
        })
    }
}
