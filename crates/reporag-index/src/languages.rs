//! Language detection, separator hierarchies and tree-sitter grammar registry.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language with a language-aware splitting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    Swift,
    Cpp,
    C,
    Go,
    Html,
    Php,
    Kotlin,
    Rust,
    Markdown,
}

/// Separators every language falls back to once its own are exhausted.
const COMMON_SEPARATORS: &[&str] = &["\n\n", "\n", " "];

impl Lang {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Java => "java",
            Self::Swift => "swift",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Go => "go",
            Self::Html => "html",
            Self::Php => "php",
            Self::Kotlin => "kotlin",
            Self::Rust => "rust",
            Self::Markdown => "markdown",
        }
    }

    /// Get the tree-sitter grammar. Returns `None` if the language has no
    /// grammar or the corresponding feature is not enabled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[cfg(feature = "lang-js")]
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            #[cfg(feature = "lang-js")]
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            #[cfg(feature = "lang-js")]
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            #[cfg(feature = "lang-java")]
            Self::Java => Some(tree_sitter_java::LANGUAGE.into()),
            #[cfg(feature = "lang-c")]
            Self::C => Some(tree_sitter_c::LANGUAGE.into()),
            #[cfg(feature = "lang-c")]
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            #[cfg(feature = "lang-go")]
            Self::Go => Some(tree_sitter_go::LANGUAGE.into()),
            #[cfg(feature = "lang-rust")]
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// AST node kinds that start a named entity (function, class, ...).
    /// Their start lines are the preferred chunk boundaries.
    #[must_use]
    pub fn entity_node_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &[
                "function_definition",
                "class_definition",
                "decorated_definition",
            ],
            Self::JavaScript | Self::TypeScript | Self::Tsx => &[
                "function_declaration",
                "generator_function_declaration",
                "class_declaration",
                "method_definition",
                "export_statement",
                "lexical_declaration",
                "interface_declaration",
                "type_alias_declaration",
                "enum_declaration",
            ],
            Self::Java => &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
                "method_declaration",
                "constructor_declaration",
            ],
            Self::C => &[
                "function_definition",
                "struct_specifier",
                "enum_specifier",
                "type_definition",
                "preproc_function_def",
            ],
            Self::Cpp => &[
                "function_definition",
                "class_specifier",
                "struct_specifier",
                "enum_specifier",
                "namespace_definition",
                "template_declaration",
                "type_definition",
            ],
            Self::Go => &[
                "function_declaration",
                "method_declaration",
                "type_declaration",
                "const_declaration",
                "var_declaration",
            ],
            Self::Rust => &[
                "function_item",
                "struct_item",
                "enum_item",
                "trait_item",
                "impl_item",
                "type_item",
                "const_item",
                "static_item",
                "macro_definition",
                "mod_item",
            ],
            Self::Swift | Self::Html | Self::Php | Self::Kotlin | Self::Markdown => &[],
        }
    }

    /// Textual separators, coarsest first. A split happens before each match so
    /// the separator stays at the start of the following piece.
    #[must_use]
    pub fn separators(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["\nclass ", "\ndef ", "\n\tdef ", "\n    def "],
            Self::JavaScript => &[
                "\nfunction ",
                "\nconst ",
                "\nlet ",
                "\nvar ",
                "\nclass ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\ndefault ",
            ],
            Self::TypeScript | Self::Tsx => &[
                "\nenum ",
                "\ninterface ",
                "\nnamespace ",
                "\ntype ",
                "\nclass ",
                "\nfunction ",
                "\nconst ",
                "\nlet ",
                "\nvar ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\ndefault ",
            ],
            Self::Java => &[
                "\nclass ",
                "\npublic ",
                "\nprotected ",
                "\nprivate ",
                "\nstatic ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::Kotlin => &[
                "\nclass ",
                "\npublic ",
                "\nprotected ",
                "\nprivate ",
                "\ninternal ",
                "\ncompanion ",
                "\nfun ",
                "\nval ",
                "\nvar ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nwhen ",
                "\ncase ",
                "\nelse ",
            ],
            Self::Swift => &[
                "\nfunc ",
                "\nclass ",
                "\nstruct ",
                "\nenum ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\ndo ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::Cpp | Self::C => &[
                "\nclass ",
                "\nvoid ",
                "\nint ",
                "\nfloat ",
                "\ndouble ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::Go => &[
                "\nfunc ",
                "\nvar ",
                "\nconst ",
                "\ntype ",
                "\nif ",
                "\nfor ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::Php => &[
                "\nfunction ",
                "\nclass ",
                "\nif ",
                "\nforeach ",
                "\nwhile ",
                "\ndo ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::Rust => &[
                "\nfn ",
                "\nconst ",
                "\nlet ",
                "\nif ",
                "\nwhile ",
                "\nfor ",
                "\nloop ",
                "\nmatch ",
            ],
            Self::Html => &[
                "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6",
                "<span", "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header", "<footer",
                "<nav", "<head", "<style", "<script", "<meta", "<title",
            ],
            Self::Markdown => &[
                "\n# ",
                "\n## ",
                "\n### ",
                "\n#### ",
                "\n##### ",
                "\n###### ",
                "```\n",
                "\n***\n",
                "\n---\n",
                "\n___\n",
            ],
        }
    }

    /// Language separators followed by the common paragraph/line/word fallbacks.
    pub fn separator_hierarchy(self) -> impl Iterator<Item = &'static str> {
        self.separators()
            .iter()
            .chain(COMMON_SEPARATORS)
            .copied()
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Map a file extension (with or without the leading dot) to a language.
#[must_use]
pub fn from_extension(ext: &str) -> Option<Lang> {
    match ext.trim_start_matches('.') {
        "py" => Some(Lang::Python),
        "js" => Some(Lang::JavaScript),
        "ts" => Some(Lang::TypeScript),
        "tsx" => Some(Lang::Tsx),
        "java" => Some(Lang::Java),
        "swift" => Some(Lang::Swift),
        "cpp" => Some(Lang::Cpp),
        "c" => Some(Lang::C),
        "go" => Some(Lang::Go),
        "html" => Some(Lang::Html),
        "php" => Some(Lang::Php),
        "kt" => Some(Lang::Kotlin),
        "rs" => Some(Lang::Rust),
        "md" => Some(Lang::Markdown),
        _ => None,
    }
}

/// Detect language from a file name or path.
#[must_use]
pub fn detect_language(path: &Path) -> Option<Lang> {
    from_extension(path.extension()?.to_str()?)
}
