/*!

Types/type aliases that abstract over the implementing backing type.

A motivating example is the `IString` type, an interned string type. A number of external crates could provide this
functionality. This module redirects to whatever chosen implementation we want. To use the
[`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString` as an alias for
`string_cache::DefaultAtom`:

```ignore
pub use string_cache::DefaultAtom as IString;
```

If we later want to change to the [`ustr` crate](https://crates.io/crates/ustr), we just define `IString` to be an
alias for `ustr::Ustr` instead. For infrastructure with very different backing implementations, we define an
abstraction layer over the implementation. For example, the `log` module could use any of a number of logging
frameworks for its implementation, but its (crate) public interface consists only of
`set_global_logging_threshold()`/`get_global_logging_threshold()` and the macros `critical!`, `error!`, `warning!`,
`info!`, `debug!`, and `trace!`.

*/

mod string_join;

use std::collections::{HashMap as StdHashMap, HashSet as StdHashSet};

// Logging
pub mod log;

// Interned string. Use `DefaultAtom` for a global cache that can be used across threads. Use `Atom` for a
// thread-local string cache.
pub use string_cache::DefaultAtom as IString;

// Join sequences with a separator
pub(crate) use string_join::join_string;

/// Hash set used for atom domains and instantiation sets. The interpretations (`I`/`J`/`K`) are stored with
/// hash-based deduplication, which is all the resource model asks for.
pub type Set<T> = StdHashSet<T>;

/// Hash map used throughout.
pub type HashMap<K, V> = StdHashMap<K, V>;
