//! System lookup via `getaddrinfo(3)`.

use std::ffi::{CStr, CString};
use std::net::Ipv4Addr;
use std::ptr;

use crate::error::ResolveFailure;

/// Returns the first IPv4 address the system resolver reports for `host`.
///
/// Blocks for as long as the system resolver takes; callers bound it.
///
/// # Errors
///
/// [`ResolveFailure::NotFound`] for any `EAI_*` code other than
/// `EAI_SYSTEM` or when no IPv4 address comes back, and
/// [`ResolveFailure::Unexpected`] for `EAI_SYSTEM` or a hostname containing
/// a NUL byte.
pub fn lookup_ipv4(host: &str) -> Result<Ipv4Addr, ResolveFailure> {
    let node = CString::new(host)
        .map_err(|_| ResolveFailure::Unexpected("hostname contains a NUL byte".into()))?;

    // SAFETY: an all-zero `addrinfo` is a valid "no constraints" hints value.
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_INET;
    hints.ai_socktype = libc::SOCK_STREAM;

    let mut res: *mut libc::addrinfo = ptr::null_mut();
    // SAFETY: `node` is NUL-terminated, `hints` outlives the call and `res`
    // is a valid out-pointer.
    let rc = unsafe { libc::getaddrinfo(node.as_ptr(), ptr::null(), &hints, &mut res) };
    if rc != 0 {
        return Err(classify(rc));
    }

    let mut found = None;
    let mut cur = res;
    while !cur.is_null() {
        // SAFETY: `cur` walks the list returned by a successful
        // `getaddrinfo` and the list has not been freed yet.
        let info = unsafe { &*cur };
        if info.ai_family == libc::AF_INET && !info.ai_addr.is_null() {
            // SAFETY: `AF_INET` entries point at a `sockaddr_in`.
            let sin = unsafe { &*info.ai_addr.cast::<libc::sockaddr_in>() };
            found = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
            break;
        }
        cur = info.ai_next;
    }

    // SAFETY: `res` came from `getaddrinfo` and is freed exactly once.
    unsafe { libc::freeaddrinfo(res) };

    found.ok_or(ResolveFailure::NotFound)
}

/// Maps a non-zero `getaddrinfo` return code to a failure.
fn classify(code: libc::c_int) -> ResolveFailure {
    if code == libc::EAI_SYSTEM {
        return ResolveFailure::Unexpected(std::io::Error::last_os_error().to_string());
    }

    // SAFETY: `gai_strerror` returns a pointer to a static NUL-terminated
    // string for every code.
    let reason = unsafe { CStr::from_ptr(libc::gai_strerror(code)) };
    tracing::debug!(code, reason = %reason.to_string_lossy(), "getaddrinfo failed");
    ResolveFailure::NotFound
}
