//! Shell completion script emission
//!
//! `stratus completion bash` prints a license header followed by the bash
//! completion script generated from the command tree. `stratus completion
//! zsh` wraps the same bash output in a zsh compatibility layer: the emitted
//! script carries the raw bash text inside a heredoc and rewrites it with
//! `sed` when the user's shell sources it, so the conversion happens at
//! load time, not at generation time.

use std::io::{self, BufWriter, Write};

use clap::Command;
use clap_complete::{generate, Shell};

use crate::error::Result;

/// License header emitted at the top of every completion script.
const BOILERPLATE: &str = r##"
# Copyright 2026 The Stratus Authors.
#
# Licensed under the Apache License, Version 2.0 (the "License");
# you may not use this file except in compliance with the License.
# You may obtain a copy of the License at
#
#     http://www.apache.org/licenses/LICENSE-2.0
#
# Unless required by applicable law or agreed to in writing, software
# distributed under the License is distributed on an "AS IS" BASIS,
# WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
# See the License for the specific language governing permissions and
# limitations under the License.
"##;

/// Zsh preamble: shim functions for the bash-only builtins the completion
/// script assumes, GNU/BSD sed word-boundary detection, and the
/// `sed`-script-producing converter. Ends by opening the heredoc that will
/// hold the raw bash completion text.
const ZSH_INIT: &str = r##"
__stratus_bash_source() {
	alias shopt=':'
	alias _expand=_bash_expand
	alias _complete=_bash_comp
	emulate -L sh
	setopt kshglob noshglob braceexpand
	source "$@"
}
__stratus_type() {
	# -t is not supported by zsh
	if [ "$1" == "-t" ]; then
		shift
		# fake Bash 4 to disable "complete -o nospace". Instead
		# "compopt +-o nospace" is used in the code to toggle trailing
		# spaces. We don't support that, but leave trailing spaces on
		# all the time
		if [ "$1" = "__stratus_compopt" ]; then
			echo builtin
			return 0
		fi
	fi
	type "$@"
}
__stratus_compgen() {
	local completions w
	completions=( $(compgen "$@") ) || return $?
	# filter by given word as prefix
	while [[ "$1" = -* && "$1" != -- ]]; do
		shift
		shift
	done
	if [[ "$1" == -- ]]; then
		shift
	fi
	for w in "${completions[@]}"; do
		if [[ "${w}" = "$1"* ]]; then
			echo "${w}"
		fi
	done
}
__stratus_compopt() {
	true # don't do anything. Not supported by bashcompinit in zsh
}
__stratus_declare() {
	if [ "$1" == "-F" ]; then
		whence -w "$@"
	else
		builtin declare "$@"
	fi
}
__stratus_ltrim_colon_completions()
{
	if [[ "$1" == *:* && "$COMP_WORDBREAKS" == *:* ]]; then
		# Remove colon-word prefix from COMPREPLY items
		local colon_word=${1%${1##*:}}
		local i=${#COMPREPLY[*]}
		while [[ $((--i)) -ge 0 ]]; do
			COMPREPLY[$i]=${COMPREPLY[$i]#"$colon_word"}
		done
	fi
}
__stratus_get_comp_words_by_ref() {
	cur="${COMP_WORDS[COMP_CWORD]}"
	prev="${COMP_WORDS[${COMP_CWORD}-1]}"
	words=("${COMP_WORDS[@]}")
	cword=("${COMP_CWORD[@]}")
}
__stratus_filedir() {
	local RET OLD_IFS w qw
	__debug "_filedir $@ cur=$cur"
	if [[ "$1" = \~* ]]; then
		# somehow does not work. Maybe, zsh does not call this at all
		eval echo "$1"
		return 0
	fi
	OLD_IFS="$IFS"
	IFS=$'\n'
	if [ "$1" = "-d" ]; then
		shift
		RET=( $(compgen -d) )
	else
		RET=( $(compgen -f) )
	fi
	IFS="$OLD_IFS"
	IFS="," __debug "RET=${RET[@]} len=${#RET[@]}"
	for w in ${RET[@]}; do
		if [[ ! "${w}" = "${cur}"* ]]; then
			continue
		fi
		if eval "[[ \"\${w}\" = *.$1 || -d \"\${w}\" ]]"; then
			qw="$(__stratus_quote "${w}")"
			if [ -d "${w}" ]; then
				COMPREPLY+=("${qw}/")
			else
				COMPREPLY+=("${qw}")
			fi
		fi
	done
}
__stratus_quote() {
    if [[ $1 == \'* || $1 == \"* ]]; then
        # Leave out first character
        printf %q "${1:1}"
    else
    	printf %q "$1"
    fi
}
autoload -U +X bashcompinit && bashcompinit
# use word boundary patterns for BSD or GNU sed
LWORD='[[:<:]]'
RWORD='[[:>:]]'
if sed --help 2>&1 | grep -q GNU; then
	LWORD='\<'
	RWORD='\>'
fi
__stratus_convert_bash_to_zsh() {
	sed \
	-e 's/declare -F/whence -w/' \
	-e 's/local \([a-zA-Z0-9_]*\)=/local \1; \1=/' \
	-e 's/flags+=("\(--.*\)=")/flags+=("\1"); two_word_flags+=("\1")/' \
	-e 's/must_have_one_flag+=("\(--.*\)=")/must_have_one_flag+=("\1")/' \
	-e "s/${LWORD}_filedir${RWORD}/__stratus_filedir/g" \
	-e "s/${LWORD}_get_comp_words_by_ref${RWORD}/__stratus_get_comp_words_by_ref/g" \
	-e "s/${LWORD}__ltrim_colon_completions${RWORD}/__stratus_ltrim_colon_completions/g" \
	-e "s/${LWORD}compgen${RWORD}/__stratus_compgen/g" \
	-e "s/${LWORD}compopt${RWORD}/__stratus_compopt/g" \
	-e "s/${LWORD}declare${RWORD}/__stratus_declare/g" \
	-e "s/\\\$(type${RWORD}/\$(__stratus_type/g" \
	<<'BASH_COMPLETION_EOF'
"##;

/// Zsh trailer: closes the heredoc and sources the converted script under
/// sh emulation.
const ZSH_TAIL: &str = r##"
BASH_COMPLETION_EOF
}
__stratus_bash_source <(__stratus_convert_bash_to_zsh)
"##;

const BASH_LONG_HELP: &str = "\
Output shell completion code for bash.

This command prints shell code which must be evaluated to provide
interactive completion of stratus commands:

    $ source <(stratus completion bash)

Note that this depends on the bash-completion framework. It must be
sourced before the stratus completion, e.g. on macOS:

    $ brew install bash-completion
    $ source $(brew --prefix)/etc/bash_completion
    $ source <(stratus completion bash)";

const ZSH_LONG_HELP: &str = "\
Output shell completion code for zsh.

This command prints shell code which must be evaluated to provide
interactive completion of stratus commands:

    $ source <(stratus completion zsh)

zsh completions are only supported in versions of zsh >= 5.2.";

/// Build the `completion` command group
pub fn command() -> Command {
    Command::new("completion")
        .about("Output shell completion code for the given shell (bash or zsh)")
        .subcommand(
            Command::new("bash")
                .about("Output shell completion code for bash")
                .long_about(BASH_LONG_HELP),
        )
        .subcommand(
            Command::new("zsh")
                .about("Output shell completion code for zsh")
                .long_about(ZSH_LONG_HELP),
        )
}

/// Run the `completion bash` subcommand against the given command tree
pub fn run_bash(root: &mut Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_bash(root, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Run the `completion zsh` subcommand against the given command tree
pub fn run_zsh(root: &mut Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_zsh(root, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write the license header followed by the bash completion script.
///
/// The header write comes first, unconditionally; if it fails, the command
/// tree is never introspected and the error propagates to the caller.
pub fn write_bash<W: Write>(root: &mut Command, out: &mut W) -> Result<()> {
    out.write_all(BOILERPLATE.as_bytes())?;
    out.write_all(&bash_completion(root))?;
    Ok(())
}

/// Write the self-converting zsh completion script: license header, shim
/// preamble, the raw bash output embedded in a heredoc, then the trailer
/// that converts and sources it.
pub fn write_zsh<W: Write>(root: &mut Command, out: &mut W) -> Result<()> {
    out.write_all(BOILERPLATE.as_bytes())?;
    out.write_all(ZSH_INIT.as_bytes())?;
    out.write_all(&bash_completion(root))?;
    out.write_all(ZSH_TAIL.as_bytes())?;
    Ok(())
}

/// Introspect the command tree into bash completion text, buffered in
/// memory so the only fallible step is the final stdout write.
fn bash_completion(root: &mut Command) -> Vec<u8> {
    let mut buf = Vec::new();
    let bin_name = root.get_name().to_string();
    generate(Shell::Bash, root, bin_name, &mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StratusError;
    use clap::Arg;

    fn sample_tree() -> Command {
        Command::new("sample")
            .subcommand(
                Command::new("deploy").arg(Arg::new("force").long("force").short('f')),
            )
            .subcommand(Command::new("status"))
    }

    /// Writer that rejects every write and counts the attempts
    struct FailingWriter {
        attempts: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bash_output_is_header_then_body() {
        let mut out = Vec::new();
        write_bash(&mut sample_tree(), &mut out).unwrap();

        assert!(out.starts_with(BOILERPLATE.as_bytes()));
        assert_eq!(
            &out[BOILERPLATE.len()..],
            bash_completion(&mut sample_tree()).as_slice()
        );
    }

    #[test]
    fn zsh_output_is_header_shim_heredoc_body_trailer() {
        let mut out = Vec::new();
        write_zsh(&mut sample_tree(), &mut out).unwrap();

        let body = bash_completion(&mut sample_tree());
        let mut expected = Vec::new();
        expected.extend_from_slice(BOILERPLATE.as_bytes());
        expected.extend_from_slice(ZSH_INIT.as_bytes());
        expected.extend_from_slice(&body);
        expected.extend_from_slice(ZSH_TAIL.as_bytes());

        assert_eq!(out, expected);
    }

    #[test]
    fn zsh_preamble_opens_heredoc_and_trailer_closes_it() {
        assert!(ZSH_INIT.ends_with("<<'BASH_COMPLETION_EOF'\n"));
        assert!(ZSH_TAIL.starts_with("\nBASH_COMPLETION_EOF\n"));
        assert!(ZSH_TAIL.ends_with(
            "__stratus_bash_source <(__stratus_convert_bash_to_zsh)\n"
        ));
    }

    #[test]
    fn bash_output_is_idempotent() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_bash(&mut sample_tree(), &mut first).unwrap();
        write_bash(&mut sample_tree(), &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zsh_output_is_idempotent() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_zsh(&mut sample_tree(), &mut first).unwrap();
        write_zsh(&mut sample_tree(), &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_command_tree_is_still_introspected() {
        let mut out = Vec::new();
        write_bash(&mut Command::new("bare"), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let body = &text[BOILERPLATE.len()..];
        assert!(!body.is_empty());
        assert!(body.contains("bare"));
    }

    #[test]
    fn header_write_failure_aborts_before_introspection() {
        let mut out = FailingWriter { attempts: 0 };
        let err = write_bash(&mut sample_tree(), &mut out).unwrap_err();

        assert!(matches!(err, StratusError::Io(_)));
        // the single failed attempt was the header write
        assert_eq!(out.attempts, 1);
    }

    #[test]
    fn completion_group_has_bash_and_zsh() {
        let cmd = command();
        assert!(cmd.find_subcommand("bash").is_some());
        assert!(cmd.find_subcommand("zsh").is_some());
    }
}
