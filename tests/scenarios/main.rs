/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use flowshell::VERSION;

mod documents;
mod editing;

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}
