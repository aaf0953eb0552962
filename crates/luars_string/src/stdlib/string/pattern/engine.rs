// Core pattern matching engine: direct interpretation, no AST
//
// Follows C Lua's lstrlib.c design:
// - MatchState holds subject, pattern, captures and the recursion budget
// - do_match recursively walks the pattern with backtracking
// - Fixed capture slots (no heap alloc during matching)

use super::class::{L_ESC, class_end, match_bracket_class, single_match};
use crate::lua_value::{LuaTable, LuaValue};
use crate::lua_vm::lua_limits::{LUA_MAXCAPTURES, SPECIALS};
use crate::lua_vm::{LuaError, LuaResult};

/// Check if pattern has no special bytes (can be searched as plain text).
/// Mirrors C Lua's `nospecials()`.
#[inline]
pub fn is_plain_pattern(pat: &[u8]) -> bool {
    !pat.iter().any(|c| SPECIALS.contains(c))
}

/// Length of a capture slot, or the sentinel it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureLen {
    Len(usize),
    /// opened, not yet closed
    Unfinished,
    /// `()` capture, records only an index
    Position,
}

#[derive(Debug, Clone, Copy)]
struct Capture {
    init: usize,
    len: CaptureLen,
}

/// Match state: everything one match attempt needs, on the stack.
pub struct MatchState<'a> {
    src: &'a [u8],
    pat: &'a [u8],
    level: usize,
    captures: [Capture; LUA_MAXCAPTURES],
    /// remaining recursion budget
    match_depth: usize,
    max_depth: usize,
}

impl<'a> MatchState<'a> {
    pub fn new(src: &'a [u8], pat: &'a [u8], max_depth: usize) -> Self {
        Self {
            src,
            pat,
            level: 0,
            captures: [Capture {
                init: 0,
                len: CaptureLen::Unfinished,
            }; LUA_MAXCAPTURES],
            match_depth: max_depth,
            max_depth,
        }
    }

    /// Prepare for a new attempt (the capture array is not re-zeroed)
    #[inline]
    pub fn reset(&mut self) {
        self.level = 0;
        self.match_depth = self.max_depth;
    }

    /// Number of captures opened by the last successful attempt.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Try to match `pat[p..]` against `src[s..]`.
    /// Returns `Some(end)` (exclusive end of the match) or `None`.
    pub fn do_match(&mut self, s: usize, p: usize) -> LuaResult<Option<usize>> {
        if self.match_depth == 0 {
            log::debug!(
                "pattern matcher exhausted its recursion budget of {}",
                self.max_depth
            );
            return Err(LuaError::ComplexityLimit);
        }
        self.match_depth -= 1;
        let result = self.match_inner(s, p);
        self.match_depth += 1;
        result
    }

    fn match_inner(&mut self, mut s: usize, mut p: usize) -> LuaResult<Option<usize>> {
        let pat = self.pat;
        // Loop instead of recursing for sequential single items
        loop {
            if p == pat.len() {
                return Ok(Some(s));
            }
            match pat[p] {
                b'(' => {
                    return if p + 1 < pat.len() && pat[p + 1] == b')' {
                        self.start_capture(s, p + 2, CaptureLen::Position)
                    } else {
                        self.start_capture(s, p + 1, CaptureLen::Unfinished)
                    };
                }
                b')' => return self.end_capture(s, p + 1),
                b'$' if p + 1 == pat.len() => {
                    return Ok((s == self.src.len()).then_some(s));
                }
                L_ESC if p + 1 < pat.len() => match pat[p + 1] {
                    b'b' => match self.match_balance(s, p + 2)? {
                        Some(e) => {
                            s = e;
                            p += 4;
                            continue;
                        }
                        None => return Ok(None),
                    },
                    b'f' => {
                        p += 2;
                        if p >= pat.len() || pat[p] != b'[' {
                            return Err(LuaError::PatternSyntax(
                                "missing '[' after '%f' in pattern".to_string(),
                            ));
                        }
                        let ep = class_end(pat, p)?;
                        let prev = if s == 0 { 0 } else { self.src[s - 1] };
                        let next = self.src.get(s).copied().unwrap_or(0);
                        if match_bracket_class(prev, pat, p, ep - 1)
                            || !match_bracket_class(next, pat, p, ep - 1)
                        {
                            return Ok(None);
                        }
                        p = ep;
                        continue;
                    }
                    d if d.is_ascii_digit() => match self.match_capture(s, d)? {
                        Some(e) => {
                            s = e;
                            p += 2;
                            continue;
                        }
                        None => return Ok(None),
                    },
                    _ => {}
                },
                _ => {}
            }

            // Single item, possibly followed by a repetition suffix
            let ep = class_end(pat, p)?;
            let m = s < self.src.len() && single_match(self.src[s], pat, p, ep);
            match pat.get(ep) {
                Some(b'?') => {
                    if m && let Some(end) = self.do_match(s + 1, ep + 1)? {
                        return Ok(Some(end));
                    }
                    p = ep + 1;
                }
                Some(b'+') => {
                    return if m {
                        self.max_expand(s + 1, p, ep)
                    } else {
                        Ok(None)
                    };
                }
                Some(b'*') => return self.max_expand(s, p, ep),
                Some(b'-') => return self.min_expand(s, p, ep),
                _ => {
                    if !m {
                        return Ok(None);
                    }
                    s += 1;
                    p = ep;
                }
            }
        }
    }

    /// Greedy repetition: take as many as possible, then back off one at a time
    fn max_expand(&mut self, s: usize, p: usize, ep: usize) -> LuaResult<Option<usize>> {
        let mut count = 0;
        while s + count < self.src.len() && single_match(self.src[s + count], self.pat, p, ep) {
            count += 1;
        }
        loop {
            if let Some(end) = self.do_match(s + count, ep + 1)? {
                return Ok(Some(end));
            }
            if count == 0 {
                return Ok(None);
            }
            count -= 1;
        }
    }

    /// Lazy repetition: grow one item at a time until the rest matches
    fn min_expand(&mut self, mut s: usize, p: usize, ep: usize) -> LuaResult<Option<usize>> {
        loop {
            if let Some(end) = self.do_match(s, ep + 1)? {
                return Ok(Some(end));
            }
            if s < self.src.len() && single_match(self.src[s], self.pat, p, ep) {
                s += 1;
            } else {
                return Ok(None);
            }
        }
    }

    fn start_capture(&mut self, s: usize, p: usize, what: CaptureLen) -> LuaResult<Option<usize>> {
        let level = self.level;
        if level >= LUA_MAXCAPTURES {
            return Err(LuaError::Capture("too many captures".to_string()));
        }
        self.captures[level] = Capture { init: s, len: what };
        self.level = level + 1;
        let result = self.do_match(s, p)?;
        if result.is_none() {
            self.level -= 1; // undo
        }
        Ok(result)
    }

    fn end_capture(&mut self, s: usize, p: usize) -> LuaResult<Option<usize>> {
        let l = self.capture_to_close()?;
        self.captures[l].len = CaptureLen::Len(s - self.captures[l].init);
        let result = self.do_match(s, p)?;
        if result.is_none() {
            self.captures[l].len = CaptureLen::Unfinished; // undo close on backtrack
        }
        Ok(result)
    }

    fn capture_to_close(&self) -> LuaResult<usize> {
        (0..self.level)
            .rev()
            .find(|&l| self.captures[l].len == CaptureLen::Unfinished)
            .ok_or_else(|| LuaError::PatternSyntax("invalid pattern capture".to_string()))
    }

    /// Resolve the digit of a `%N` back-reference to a closed capture index
    fn check_capture(&self, d: u8) -> LuaResult<usize> {
        let n = (d - b'0') as usize;
        match n.checked_sub(1) {
            Some(l) if l < self.level && self.captures[l].len != CaptureLen::Unfinished => Ok(l),
            _ => Err(LuaError::Capture(format!("invalid capture index %{}", n))),
        }
    }

    /// Back reference %1-%9
    fn match_capture(&self, s: usize, d: u8) -> LuaResult<Option<usize>> {
        let l = self.check_capture(d)?;
        let CaptureLen::Len(len) = self.captures[l].len else {
            // a position capture has no text to compare against
            return Ok(None);
        };
        let init = self.captures[l].init;
        if self.src.len() - s >= len && self.src[init..init + len] == self.src[s..s + len] {
            Ok(Some(s + len))
        } else {
            Ok(None)
        }
    }

    /// Balanced match %bxy; `p` points at `x`
    fn match_balance(&self, s: usize, p: usize) -> LuaResult<Option<usize>> {
        if p + 1 >= self.pat.len() {
            return Err(LuaError::PatternSyntax(
                "malformed pattern (missing arguments to '%b')".to_string(),
            ));
        }
        let open = self.pat[p];
        let close = self.pat[p + 1];
        if s >= self.src.len() || self.src[s] != open {
            return Ok(None);
        }
        let mut depth = 1usize;
        for (i, &c) in self.src.iter().enumerate().skip(s + 1) {
            if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(i + 1));
                }
            } else if c == open {
                depth += 1;
            }
        }
        Ok(None)
    }

    /// Capture `i` of a match spanning `s..e`. With no explicit captures,
    /// capture 0 is the whole match.
    pub fn get_capture(&self, i: usize, s: usize, e: usize) -> LuaResult<CaptureValue> {
        if i >= self.level {
            return if i == 0 {
                Ok(CaptureValue::Substring(s, e))
            } else {
                Err(LuaError::Capture(format!("invalid capture index %{}", i + 1)))
            };
        }
        let cap = self.captures[i];
        match cap.len {
            CaptureLen::Unfinished => Err(LuaError::Capture("unfinished capture".to_string())),
            CaptureLen::Position => Ok(CaptureValue::Position(cap.init + 1)),
            CaptureLen::Len(len) => Ok(CaptureValue::Substring(cap.init, cap.init + len)),
        }
    }

    /// All captures of a match spanning `s..e`. `whole_match` substitutes the
    /// whole match when the pattern declares no captures.
    pub fn get_captures(&self, whole_match: bool, s: usize, e: usize) -> LuaResult<CaptureResults> {
        let n = if self.level == 0 && whole_match { 1 } else { self.level };
        let mut result = CaptureResults::new();
        for i in 0..n {
            result.data[i] = self.get_capture(i, s, e)?;
            result.count += 1;
        }
        Ok(result)
    }
}

// ======================== Public API ========================

/// A capture value returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureValue {
    Substring(usize, usize), // byte start, byte end in source text
    Position(usize),         // 1-based byte position
}

impl CaptureValue {
    /// Host value of this capture: a string, or an integer for `()` captures
    pub fn to_value(&self, src: &[u8]) -> LuaValue {
        match *self {
            CaptureValue::Substring(start, end) => LuaValue::string(&src[start..end]),
            CaptureValue::Position(p) => LuaValue::integer(p as i64),
        }
    }

    fn append_to(&self, src: &[u8], out: &mut Vec<u8>) {
        match *self {
            CaptureValue::Substring(start, end) => out.extend_from_slice(&src[start..end]),
            CaptureValue::Position(p) => {
                out.extend_from_slice(itoa::Buffer::new().format(p).as_bytes())
            }
        }
    }
}

/// Fixed-size capture results, no Vec allocation per match
#[derive(Debug, Clone, Copy)]
pub struct CaptureResults {
    data: [CaptureValue; LUA_MAXCAPTURES],
    count: usize,
}

impl Default for CaptureResults {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureResults {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            data: [CaptureValue::Substring(0, 0); LUA_MAXCAPTURES],
            count: 0,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn iter(&self) -> std::slice::Iter<'_, CaptureValue> {
        self.data[..self.count].iter()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&CaptureValue> {
        self.data[..self.count].get(index)
    }

    pub fn to_values(&self, src: &[u8]) -> Vec<LuaValue> {
        self.iter().map(|c| c.to_value(src)).collect()
    }
}

impl<'a> IntoIterator for &'a CaptureResults {
    type Item = &'a CaptureValue;
    type IntoIter = std::slice::Iter<'a, CaptureValue>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.data[..self.count].iter()
    }
}

/// Information about a single match
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub start: usize, // byte offset
    pub end: usize,   // byte offset, exclusive
    pub captures: CaptureResults,
}

/// Convert a 1-based, possibly negative `init` argument into a 0-based
/// offset clamped to `[0, len]`.
#[inline]
pub fn normalize_init(init: i64, len: usize) -> usize {
    if init > 0 {
        ((init - 1) as u64).min(len as u64) as usize
    } else if init < 0 {
        len.saturating_sub(init.unsigned_abs().min(usize::MAX as u64) as usize)
    } else {
        0
    }
}

/// Find the first match at or after the 0-based offset `init`.
///
/// With `plain`, or when the pattern has no special bytes, this is a literal
/// substring search. Captures exclude the whole match.
pub fn find(
    src: &[u8],
    pat: &[u8],
    init: usize,
    plain: bool,
    max_depth: usize,
) -> LuaResult<Option<MatchInfo>> {
    let init = init.min(src.len());
    if plain || is_plain_pattern(pat) {
        return Ok(find_bytes_in_slice(&src[init..], pat).map(|pos| MatchInfo {
            start: init + pos,
            end: init + pos + pat.len(),
            captures: CaptureResults::new(),
        }));
    }
    search(src, pat, init, false, max_depth)
}

/// Like [`find`] but always runs the matcher, and reports the whole match as
/// the only capture when the pattern declares none.
pub fn str_match(src: &[u8], pat: &[u8], init: usize, max_depth: usize) -> LuaResult<Option<MatchInfo>> {
    search(src, pat, init.min(src.len()), true, max_depth)
}

fn search(
    src: &[u8],
    pat: &[u8],
    init: usize,
    whole_match: bool,
    max_depth: usize,
) -> LuaResult<Option<MatchInfo>> {
    let anchor = pat.first() == Some(&b'^');
    let p0 = usize::from(anchor);
    let mut ms = MatchState::new(src, pat, max_depth);
    let mut s = init;
    loop {
        ms.reset();
        if let Some(end) = ms.do_match(s, p0)? {
            let captures = ms.get_captures(whole_match, s, end)?;
            return Ok(Some(MatchInfo {
                start: s,
                end,
                captures,
            }));
        }
        if anchor || s >= src.len() {
            return Ok(None);
        }
        s += 1;
    }
}

/// Cursor of a global match iteration.
///
/// Restartable only by building a new one. `^` has no anchoring effect here.
#[derive(Debug, Clone)]
pub struct GMatchState {
    offset: usize,
    last_match: Option<usize>,
    positions: bool,
}

impl GMatchState {
    /// `init` is a 0-based offset. With `positions`, captures exclude the
    /// whole match (the caller reports start/end instead).
    pub fn new(init: usize, positions: bool) -> Self {
        Self {
            offset: init,
            last_match: None,
            positions,
        }
    }

    pub fn next_match(&mut self, src: &[u8], pat: &[u8], max_depth: usize) -> LuaResult<Option<MatchInfo>> {
        let mut ms = MatchState::new(src, pat, max_depth);
        while self.offset <= src.len() {
            ms.reset();
            // an empty match right where the previous match ended is skipped
            if let Some(end) = ms.do_match(self.offset, 0)?
                && Some(end) != self.last_match
            {
                let start = self.offset;
                self.offset = end;
                self.last_match = Some(end);
                let captures = ms.get_captures(!self.positions, start, end)?;
                return Ok(Some(MatchInfo {
                    start,
                    end,
                    captures,
                }));
            }
            self.offset += 1;
        }
        Ok(None)
    }
}

/// Borrowing iterator over successive matches. Stops after the first error.
pub struct GMatch<'a> {
    src: &'a [u8],
    pat: &'a [u8],
    state: GMatchState,
    max_depth: usize,
    done: bool,
}

impl<'a> GMatch<'a> {
    pub fn new(src: &'a [u8], pat: &'a [u8], init: usize, max_depth: usize) -> Self {
        Self {
            src,
            pat,
            state: GMatchState::new(init.min(src.len()), false),
            max_depth,
            done: false,
        }
    }
}

impl Iterator for GMatch<'_> {
    type Item = LuaResult<MatchInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.state.next_match(self.src, self.pat, self.max_depth) {
            Ok(Some(m)) => Some(Ok(m)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// What `gsub` puts in place of each match
pub enum Replacement<'r> {
    /// Template with `%0`-`%9` and `%%` escapes
    Template(&'r [u8]),
    /// Keyed by the first capture (or the whole match)
    Table(&'r LuaTable),
    /// Called with all captures (or the whole match)
    Function(&'r dyn Fn(&[LuaValue]) -> LuaResult<Vec<LuaValue>>),
}

/// Global substitution. `max` limits the number of replacements
/// (`None` = unbounded). Returns the new bytes and the substitution count.
pub fn gsub(
    src: &[u8],
    pat: &[u8],
    repl: &Replacement<'_>,
    max: Option<usize>,
    max_depth: usize,
) -> LuaResult<(Vec<u8>, usize)> {
    let anchor = pat.first() == Some(&b'^');
    let p0 = usize::from(anchor);
    let mut ms = MatchState::new(src, pat, max_depth);
    let mut result = Vec::with_capacity(src.len());
    let mut s = 0usize;
    let mut last_match = None;
    let mut count = 0usize;

    while max.is_none_or(|m| count < m) {
        ms.reset();
        let end = ms.do_match(s, p0)?;
        if let Some(e) = end
            && end != last_match
        {
            count += 1;
            add_value(&ms, &mut result, s, e, repl)?;
            s = e;
            last_match = end;
        } else if s < src.len() {
            result.push(src[s]);
            s += 1;
        } else {
            break;
        }
        if anchor {
            break;
        }
    }
    result.extend_from_slice(&src[s..]);
    log::trace!("gsub: {} substitutions over {} bytes", count, src.len());
    Ok((result, count))
}

/// Append the replacement for the match `s..e`, one dispatch point for all
/// replacement kinds.
fn add_value(
    ms: &MatchState,
    out: &mut Vec<u8>,
    s: usize,
    e: usize,
    repl: &Replacement<'_>,
) -> LuaResult<()> {
    let value = match repl {
        Replacement::Template(template) => return add_template(ms, out, template, s, e),
        Replacement::Table(table) => table.get(&ms.get_capture(0, s, e)?.to_value(ms.src)),
        Replacement::Function(f) => {
            let args = ms.get_captures(true, s, e)?.to_values(ms.src);
            f(&args)?.into_iter().next().unwrap_or_default()
        }
    };
    if value.is_falsy() {
        // keep the original text
        out.extend_from_slice(&ms.src[s..e]);
        return Ok(());
    }
    match value.to_lua_string() {
        Some(bytes) => {
            out.extend_from_slice(&bytes);
            Ok(())
        }
        None => Err(LuaError::runtime(format!(
            "invalid replacement value (a {})",
            value.type_name()
        ))),
    }
}

/// Expand %0-%9 and %% in a replacement template
fn add_template(
    ms: &MatchState,
    out: &mut Vec<u8>,
    template: &[u8],
    s: usize,
    e: usize,
) -> LuaResult<()> {
    let mut i = 0;
    while i < template.len() {
        if template[i] != L_ESC {
            // push the whole run up to the next '%'
            let start = i;
            while i < template.len() && template[i] != L_ESC {
                i += 1;
            }
            out.extend_from_slice(&template[start..i]);
            continue;
        }
        i += 1; // skip ESC
        match template.get(i).copied() {
            Some(L_ESC) => out.push(L_ESC),
            Some(b'0') => out.extend_from_slice(&ms.src[s..e]),
            Some(d) if d.is_ascii_digit() => {
                ms.get_capture((d - b'1') as usize, s, e)?
                    .append_to(ms.src, out);
            }
            Some(c) => {
                return Err(LuaError::FormatSyntax(format!(
                    "invalid use of '%' in replacement string: after '%' must be '0'-'9' or '%', but found symbol '{}' with code {} at pos {}",
                    c as char,
                    c,
                    i + 1
                )));
            }
            None => {
                return Err(LuaError::FormatSyntax(
                    "invalid use of '%' in replacement string: after '%' must be '0'-'9' or '%', but found end of string"
                        .to_string(),
                ));
            }
        }
        i += 1;
    }
    Ok(())
}

// ======================== Plain Pattern Fast Path ========================

/// Find a byte pattern in a byte slice
#[inline]
fn find_bytes_in_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
