//! Built-in symbols - functions, constants and classes the runtime provides.
//!
//! Signatures are written in PHP's own parameter syntax and parsed once per
//! process into a [`Registry`] that every [`AnalysisSession`] starts from.
//!
//! ```text
//! ("strpos", "string $haystack, string $needle, int $offset = 0", "int|false")
//! ```
//!
//! Parameters may be by-reference (`&$matches`), variadic (`...$values`) or
//! defaulted (`= 0`); `callable` parameters are recorded as callback
//! positions.
//!
//! [`AnalysisSession`]: crate::analyze::AnalysisSession

use once_cell::sync::Lazy;

use crate::analyze::docblock::TypeResolver;
use crate::analyze::lattice::{Argument, FunctionType, Type, TypeUnion};
use crate::analyze::registry::{ClassEntry, ClassKind, Member, MemberKind, Registry, Visibility};
use crate::analyze::scope::{ClassContext, NameResolver};

/// `(name, parameters, return type)`
type Signature = (&'static str, &'static str, &'static str);

// =========================================================================
// Functions
// =========================================================================

const STRING_FUNCTIONS: &[Signature] = &[
    ("strlen", "string $string", "int"),
    ("strtolower", "string $string", "string"),
    ("strtoupper", "string $string", "string"),
    ("ucfirst", "string $string", "string"),
    ("lcfirst", "string $string", "string"),
    ("ucwords", "string $string, string $separators = \" \"", "string"),
    ("trim", "string $string, string $characters = \" \"", "string"),
    ("ltrim", "string $string, string $characters = \" \"", "string"),
    ("rtrim", "string $string, string $characters = \" \"", "string"),
    ("str_replace", "array|string $search, array|string $replace, array|string $subject, int &$count = null", "string|array"),
    ("str_ireplace", "array|string $search, array|string $replace, array|string $subject, int &$count = null", "string|array"),
    ("str_repeat", "string $string, int $times", "string"),
    ("str_pad", "string $string, int $length, string $pad_string = \" \", int $pad_type = 1", "string"),
    ("str_split", "string $string, int $length = 1", "string[]"),
    ("str_contains", "string $haystack, string $needle", "bool"),
    ("str_starts_with", "string $haystack, string $needle", "bool"),
    ("str_ends_with", "string $haystack, string $needle", "bool"),
    ("strpos", "string $haystack, string $needle, int $offset = 0", "int|false"),
    ("stripos", "string $haystack, string $needle, int $offset = 0", "int|false"),
    ("strrpos", "string $haystack, string $needle, int $offset = 0", "int|false"),
    ("strstr", "string $haystack, string $needle, bool $before_needle = false", "string|false"),
    ("strrchr", "string $haystack, string $needle", "string|false"),
    ("substr", "string $string, int $offset, ?int $length = null", "string"),
    ("substr_count", "string $haystack, string $needle", "int"),
    ("substr_replace", "array|string $string, array|string $replace, array|int $offset, array|int|null $length = null", "string|array"),
    ("strcmp", "string $string1, string $string2", "int"),
    ("strcasecmp", "string $string1, string $string2", "int"),
    ("strncmp", "string $string1, string $string2, int $length", "int"),
    ("strrev", "string $string", "string"),
    ("sprintf", "string $format, mixed ...$values", "string"),
    ("vsprintf", "string $format, array $values", "string"),
    ("printf", "string $format, mixed ...$values", "int"),
    ("number_format", "float $num, int $decimals = 0, ?string $decimal_separator = \".\", ?string $thousands_separator = \",\"", "string"),
    ("implode", "array|string $separator, ?array $array = null", "string"),
    ("join", "array|string $separator, ?array $array = null", "string"),
    ("explode", "string $separator, string $string, int $limit = PHP_INT_MAX", "string[]"),
    ("nl2br", "string $string, bool $use_xhtml = true", "string"),
    ("htmlspecialchars", "string $string, int $flags = 3, ?string $encoding = null, bool $double_encode = true", "string"),
    ("htmlentities", "string $string, int $flags = 3, ?string $encoding = null, bool $double_encode = true", "string"),
    ("html_entity_decode", "string $string, int $flags = 3, ?string $encoding = null", "string"),
    ("addslashes", "string $string", "string"),
    ("stripslashes", "string $string", "string"),
    ("strip_tags", "string $string, array|string|null $allowed_tags = null", "string"),
    ("wordwrap", "string $string, int $width = 75, string $break = \"\\n\", bool $cut_long_words = false", "string"),
    ("md5", "string $string, bool $binary = false", "string"),
    ("sha1", "string $string, bool $binary = false", "string"),
    ("crc32", "string $string", "int"),
    ("hash", "string $algo, string $data, bool $binary = false", "string"),
    ("base64_encode", "string $string", "string"),
    ("base64_decode", "string $string, bool $strict = false", "string|false"),
    ("bin2hex", "string $string", "string"),
    ("hex2bin", "string $string", "string|false"),
    ("urlencode", "string $string", "string"),
    ("urldecode", "string $string", "string"),
    ("rawurlencode", "string $string", "string"),
    ("http_build_query", "array|object $data, string $numeric_prefix = \"\", ?string $arg_separator = null", "string"),
    ("parse_str", "string $string, array &$result", "void"),
    ("parse_url", "string $url, int $component = -1", "mixed"),
    ("json_encode", "mixed $value, int $flags = 0, int $depth = 512", "string|false"),
    ("json_decode", "string $json, ?bool $associative = null, int $depth = 512, int $flags = 0", "mixed"),
    ("serialize", "mixed $value", "string"),
    ("unserialize", "string $data, array $options = []", "mixed"),
    ("mb_strlen", "string $string, ?string $encoding = null", "int"),
    ("mb_substr", "string $string, int $start, ?int $length = null, ?string $encoding = null", "string"),
    ("mb_strtolower", "string $string, ?string $encoding = null", "string"),
    ("mb_strtoupper", "string $string, ?string $encoding = null", "string"),
    ("mb_strpos", "string $haystack, string $needle, int $offset = 0, ?string $encoding = null", "int|false"),
    ("chr", "int $codepoint", "string"),
    ("ord", "string $character", "int"),
    ("dirname", "string $path, int $levels = 1", "string"),
    ("basename", "string $path, string $suffix = \"\"", "string"),
    ("pathinfo", "string $path, int $flags = 15", "array|string"),
    ("uniqid", "string $prefix = \"\", bool $more_entropy = false", "string"),
    ("lcg_value", "", "float"),
    ("ctype_digit", "mixed $text", "bool"),
    ("ctype_alpha", "mixed $text", "bool"),
    ("ctype_space", "mixed $text", "bool"),
];

const REGEX_FUNCTIONS: &[Signature] = &[
    ("preg_match", "string $pattern, string $subject, array &$matches = null, int $flags = 0, int $offset = 0", "int|false"),
    ("preg_match_all", "string $pattern, string $subject, array &$matches = null, int $flags = 1, int $offset = 0", "int|false"),
    ("preg_replace", "string|array $pattern, string|array $replacement, string|array $subject, int $limit = -1, int &$count = null", "string|array|null"),
    ("preg_replace_callback", "string|array $pattern, callable $callback, string|array $subject, int $limit = -1, int &$count = null, int $flags = 0", "string|array|null"),
    ("preg_split", "string $pattern, string $subject, int $limit = -1, int $flags = 0", "string[]|false"),
    ("preg_quote", "string $str, ?string $delimiter = null", "string"),
    ("preg_grep", "string $pattern, array $array, int $flags = 0", "array|false"),
    ("preg_last_error", "", "int"),
];

const ARRAY_FUNCTIONS: &[Signature] = &[
    ("count", "Countable|array $value, int $mode = 0", "int"),
    ("sizeof", "Countable|array $value, int $mode = 0", "int"),
    ("array_map", "?callable $callback, array $array, array ...$arrays", "array"),
    ("array_filter", "array $array, ?callable $callback = null, int $mode = 0", "array"),
    ("array_reduce", "array $array, callable $callback, mixed $initial = null", "mixed"),
    ("array_walk", "array &$array, callable $callback, mixed $arg = null", "bool"),
    ("array_keys", "array $array, mixed $filter_value = null, bool $strict = false", "array"),
    ("array_values", "array $array", "array"),
    ("array_merge", "array ...$arrays", "array"),
    ("array_merge_recursive", "array ...$arrays", "array"),
    ("array_replace", "array $array, array ...$replacements", "array"),
    ("array_combine", "array $keys, array $values", "array"),
    ("array_flip", "array $array", "array"),
    ("array_slice", "array $array, int $offset, ?int $length = null, bool $preserve_keys = false", "array"),
    ("array_splice", "array &$array, int $offset, ?int $length = null, mixed $replacement = []", "array"),
    ("array_push", "array &$array, mixed ...$values", "int"),
    ("array_pop", "array &$array", "mixed"),
    ("array_shift", "array &$array", "mixed"),
    ("array_unshift", "array &$array, mixed ...$values", "int"),
    ("array_key_exists", "string|int $key, array $array", "bool"),
    ("key_exists", "string|int $key, array $array", "bool"),
    ("array_search", "mixed $needle, array $haystack, bool $strict = false", "int|string|false"),
    ("in_array", "mixed $needle, array $haystack, bool $strict = false", "bool"),
    ("array_unique", "array $array, int $flags = 2", "array"),
    ("array_reverse", "array $array, bool $preserve_keys = false", "array"),
    ("array_sum", "array $array", "int|float"),
    ("array_product", "array $array", "int|float"),
    ("array_fill", "int $start_index, int $count, mixed $value", "array"),
    ("array_fill_keys", "array $keys, mixed $value", "array"),
    ("array_pad", "array $array, int $length, mixed $value", "array"),
    ("array_key_first", "array $array", "int|string|null"),
    ("array_key_last", "array $array", "int|string|null"),
    ("array_column", "array $array, int|string|null $column_key, int|string|null $index_key = null", "array"),
    ("array_diff", "array $array, array ...$arrays", "array"),
    ("array_diff_key", "array $array, array ...$arrays", "array"),
    ("array_intersect", "array $array, array ...$arrays", "array"),
    ("array_intersect_key", "array $array, array ...$arrays", "array"),
    ("array_chunk", "array $array, int $length, bool $preserve_keys = false", "array[]"),
    ("array_is_list", "array $array", "bool"),
    ("array_rand", "array $array, int $num = 1", "int|string|array"),
    ("range", "mixed $start, mixed $end, int|float $step = 1", "array"),
    ("compact", "mixed $var_name, mixed ...$var_names", "array"),
    ("extract", "array &$array, int $flags = 0, string $prefix = \"\"", "int"),
    ("sort", "array &$array, int $flags = 0", "bool"),
    ("rsort", "array &$array, int $flags = 0", "bool"),
    ("ksort", "array &$array, int $flags = 0", "bool"),
    ("krsort", "array &$array, int $flags = 0", "bool"),
    ("asort", "array &$array, int $flags = 0", "bool"),
    ("arsort", "array &$array, int $flags = 0", "bool"),
    ("usort", "array &$array, callable $callback", "bool"),
    ("uasort", "array &$array, callable $callback", "bool"),
    ("uksort", "array &$array, callable $callback", "bool"),
    ("shuffle", "array &$array", "bool"),
    ("current", "array|object $array", "mixed"),
    ("key", "array|object $array", "int|string|null"),
    ("next", "array|object &$array", "mixed"),
    ("prev", "array|object &$array", "mixed"),
    ("reset", "array|object &$array", "mixed"),
    ("end", "array|object &$array", "mixed"),
    ("iterator_to_array", "Traversable|array $iterator, bool $preserve_keys = true", "array"),
    ("iterator_count", "Traversable|array $iterator", "int"),
];

const MATH_FUNCTIONS: &[Signature] = &[
    ("abs", "int|float $num", "int|float"),
    ("ceil", "int|float $num", "float"),
    ("floor", "int|float $num", "float"),
    ("round", "int|float $num, int $precision = 0, int $mode = 1", "float"),
    ("min", "mixed $value, mixed ...$values", "mixed"),
    ("max", "mixed $value, mixed ...$values", "mixed"),
    ("intdiv", "int $num1, int $num2", "int"),
    ("fmod", "float $num1, float $num2", "float"),
    ("sqrt", "float $num", "float"),
    ("exp", "float $num", "float"),
    ("log", "float $num, float $base = M_E", "float"),
    ("log10", "float $num", "float"),
    ("sin", "float $num", "float"),
    ("cos", "float $num", "float"),
    ("tan", "float $num", "float"),
    ("pow", "mixed $num, mixed $exponent", "int|float"),
    ("pi", "", "float"),
    ("rand", "int $min = 0, int $max = 0", "int"),
    ("mt_rand", "int $min = 0, int $max = 0", "int"),
    ("random_int", "int $min, int $max", "int"),
    ("random_bytes", "int $length", "string"),
    ("is_nan", "float $num", "bool"),
    ("is_finite", "float $num", "bool"),
    ("is_infinite", "float $num", "bool"),
    ("base_convert", "string $num, int $from_base, int $to_base", "string"),
    ("bindec", "string $binary_string", "int|float"),
    ("hexdec", "string $hex_string", "int|float"),
    ("octdec", "string $octal_string", "int|float"),
    ("dechex", "int $num", "string"),
    ("decbin", "int $num", "string"),
    ("decoct", "int $num", "string"),
];

const TYPE_FUNCTIONS: &[Signature] = &[
    ("is_int", "mixed $value", "bool"),
    ("is_integer", "mixed $value", "bool"),
    ("is_long", "mixed $value", "bool"),
    ("is_float", "mixed $value", "bool"),
    ("is_double", "mixed $value", "bool"),
    ("is_string", "mixed $value", "bool"),
    ("is_bool", "mixed $value", "bool"),
    ("is_array", "mixed $value", "bool"),
    ("is_object", "mixed $value", "bool"),
    ("is_null", "mixed $value", "bool"),
    ("is_numeric", "mixed $value", "bool"),
    ("is_callable", "mixed $value, bool $syntax_only = false, string &$callable_name = null", "bool"),
    ("is_iterable", "mixed $value", "bool"),
    ("is_countable", "mixed $value", "bool"),
    ("is_scalar", "mixed $value", "bool"),
    ("is_resource", "mixed $value", "bool"),
    ("intval", "mixed $value, int $base = 10", "int"),
    ("floatval", "mixed $value", "float"),
    ("doubleval", "mixed $value", "float"),
    ("strval", "mixed $value", "string"),
    ("boolval", "mixed $value", "bool"),
    ("settype", "mixed &$var, string $type", "bool"),
    ("gettype", "mixed $value", "string"),
    ("get_debug_type", "mixed $value", "string"),
    ("get_class", "object $object = null", "string"),
    ("get_parent_class", "object|string $object_or_class = null", "string|false"),
    ("get_object_vars", "object $object", "array"),
    ("get_called_class", "", "string"),
    ("method_exists", "object|string $object_or_class, string $method", "bool"),
    ("property_exists", "object|string $object_or_class, string $property", "bool"),
    ("class_exists", "string $class, bool $autoload = true", "bool"),
    ("interface_exists", "string $interface, bool $autoload = true", "bool"),
    ("trait_exists", "string $trait, bool $autoload = true", "bool"),
    ("function_exists", "string $function", "bool"),
    ("is_a", "mixed $object_or_class, string $class, bool $allow_string = false", "bool"),
    ("is_subclass_of", "mixed $object_or_class, string $class, bool $allow_string = true", "bool"),
    ("spl_object_id", "object $object", "int"),
    ("spl_object_hash", "object $object", "string"),
    ("spl_autoload_register", "?callable $callback = null, bool $throw = true, bool $prepend = false", "bool"),
    ("call_user_func", "callable $callback, mixed ...$args", "mixed"),
    ("call_user_func_array", "callable $callback, array $args", "mixed"),
    ("func_get_args", "", "array"),
    ("func_num_args", "", "int"),
    ("define", "string $constant_name, mixed $value, bool $case_insensitive = false", "bool"),
    ("defined", "string $constant_name", "bool"),
    ("constant", "string $name", "mixed"),
    ("filter_var", "mixed $value, int $filter = 516, array|int $options = 0", "mixed"),
    ("version_compare", "string $version1, string $version2, ?string $operator = null", "int|bool"),
    ("assert", "mixed $assertion, mixed $description = null", "bool"),
];

const OUTPUT_FUNCTIONS: &[Signature] = &[
    ("var_dump", "mixed $value, mixed ...$values", "void"),
    ("print_r", "mixed $value, bool $return = false", "string|bool"),
    ("var_export", "mixed $value, bool $return = false", "?string"),
    ("error_log", "string $message, int $message_type = 0, ?string $destination = null, ?string $additional_headers = null", "bool"),
    ("trigger_error", "string $message, int $error_level = E_USER_NOTICE", "bool"),
    ("user_error", "string $message, int $error_level = E_USER_NOTICE", "bool"),
    ("header", "string $header, bool $replace = true, int $response_code = 0", "void"),
    ("headers_sent", "", "bool"),
    ("http_response_code", "int $response_code = 0", "int|bool"),
    ("ob_start", "?callable $callback = null, int $chunk_size = 0, int $flags = 112", "bool"),
    ("ob_get_clean", "", "string|false"),
    ("ob_end_clean", "", "bool"),
    ("flush", "", "void"),
    ("error_reporting", "?int $error_level = null", "int"),
    ("ini_set", "string $option, string|int|float|bool|null $value", "string|false"),
    ("ini_get", "string $option", "string|false"),
    ("set_error_handler", "?callable $callback, int $error_levels = E_ALL", "mixed"),
    ("set_exception_handler", "?callable $callback", "mixed"),
    ("register_shutdown_function", "callable $callback, mixed ...$args", "void"),
    ("getenv", "?string $name = null, bool $local_only = false", "string|array|false"),
    ("putenv", "string $assignment", "bool"),
    ("debug_backtrace", "int $options = 1, int $limit = 0", "array"),
    ("memory_get_usage", "bool $real_usage = false", "int"),
    ("gc_collect_cycles", "", "int"),
    ("phpversion", "?string $extension = null", "string|false"),
    ("php_sapi_name", "", "string|false"),
    ("set_time_limit", "int $seconds", "bool"),
    ("password_hash", "string $password, string|int|null $algo, array $options = []", "string"),
    ("password_verify", "string $password, string $hash", "bool"),
];

const FILE_FUNCTIONS: &[Signature] = &[
    ("file_exists", "string $filename", "bool"),
    ("is_file", "string $filename", "bool"),
    ("is_dir", "string $filename", "bool"),
    ("is_readable", "string $filename", "bool"),
    ("is_writable", "string $filename", "bool"),
    ("file_get_contents", "string $filename, bool $use_include_path = false, mixed $context = null, int $offset = 0, ?int $length = null", "string|false"),
    ("file_put_contents", "string $filename, mixed $data, int $flags = 0, mixed $context = null", "int|false"),
    ("file", "string $filename, int $flags = 0, mixed $context = null", "string[]|false"),
    ("fopen", "string $filename, string $mode, bool $use_include_path = false, mixed $context = null", "resource|false"),
    ("fclose", "resource $stream", "bool"),
    ("fread", "resource $stream, int $length", "string|false"),
    ("fwrite", "resource $stream, string $data, ?int $length = null", "int|false"),
    ("fputs", "resource $stream, string $data, ?int $length = null", "int|false"),
    ("fgets", "resource $stream, ?int $length = null", "string|false"),
    ("fgetcsv", "resource $stream, ?int $length = null, string $separator = \",\"", "array|false"),
    ("feof", "resource $stream", "bool"),
    ("unlink", "string $filename, mixed $context = null", "bool"),
    ("mkdir", "string $directory, int $permissions = 0777, bool $recursive = false, mixed $context = null", "bool"),
    ("rmdir", "string $directory, mixed $context = null", "bool"),
    ("scandir", "string $directory, int $sorting_order = 0, mixed $context = null", "string[]|false"),
    ("glob", "string $pattern, int $flags = 0", "string[]|false"),
    ("realpath", "string $path", "string|false"),
    ("touch", "string $filename, ?int $mtime = null, ?int $atime = null", "bool"),
    ("copy", "string $from, string $to, mixed $context = null", "bool"),
    ("rename", "string $from, string $to, mixed $context = null", "bool"),
    ("filesize", "string $filename", "int|false"),
    ("filemtime", "string $filename", "int|false"),
    ("tempnam", "string $directory, string $prefix", "string|false"),
    ("sys_get_temp_dir", "", "string"),
    ("getcwd", "", "string|false"),
    ("chdir", "string $directory", "bool"),
];

const TIME_FUNCTIONS: &[Signature] = &[
    ("time", "", "int"),
    ("microtime", "bool $as_float = false", "string|float"),
    ("hrtime", "bool $as_number = false", "array|int|float|false"),
    ("date", "string $format, ?int $timestamp = null", "string"),
    ("gmdate", "string $format, ?int $timestamp = null", "string"),
    ("mktime", "int $hour, ?int $minute = null, ?int $second = null, ?int $month = null, ?int $day = null, ?int $year = null", "int|false"),
    ("strtotime", "string $datetime, ?int $baseTimestamp = null", "int|false"),
    ("checkdate", "int $month, int $day, int $year", "bool"),
    ("date_default_timezone_set", "string $timezoneId", "bool"),
    ("date_default_timezone_get", "", "string"),
    ("sleep", "int $seconds", "int"),
    ("usleep", "int $microseconds", "void"),
];

// =========================================================================
// Constants
// =========================================================================

fn constants() -> Vec<(&'static str, Type)> {
    let mut constants = vec![
        ("PHP_EOL", Type::string_value("\n")),
        ("PHP_INT_MAX", Type::Int(Some(i64::MAX))),
        ("PHP_INT_MIN", Type::Int(Some(i64::MIN))),
        ("PHP_INT_SIZE", Type::Int(Some(8))),
        ("PHP_FLOAT_EPSILON", Type::Float(Some(f64::EPSILON))),
        ("PHP_FLOAT_MAX", Type::Float(Some(f64::MAX))),
        ("PHP_FLOAT_MIN", Type::Float(Some(f64::MIN_POSITIVE))),
        ("PHP_FLOAT_DIG", Type::Int(Some(15))),
        ("PHP_VERSION", Type::string()),
        ("PHP_MAJOR_VERSION", Type::int()),
        ("PHP_MINOR_VERSION", Type::int()),
        ("PHP_OS", Type::string()),
        ("PHP_OS_FAMILY", Type::string()),
        ("DIRECTORY_SEPARATOR", Type::string_value("/")),
        ("PATH_SEPARATOR", Type::string_value(":")),
        ("M_PI", Type::Float(Some(std::f64::consts::PI))),
        ("M_E", Type::Float(Some(std::f64::consts::E))),
        ("NAN", Type::float()),
        ("INF", Type::float()),
        ("STDIN", Type::Resource),
        ("STDOUT", Type::Resource),
        ("STDERR", Type::Resource),
    ];
    let ints: &[(&str, i64)] = &[
        ("E_ERROR", 1),
        ("E_WARNING", 2),
        ("E_PARSE", 4),
        ("E_NOTICE", 8),
        ("E_USER_ERROR", 256),
        ("E_USER_WARNING", 512),
        ("E_USER_NOTICE", 1024),
        ("E_STRICT", 2048),
        ("E_DEPRECATED", 8192),
        ("E_USER_DEPRECATED", 16384),
        ("E_ALL", 32767),
        ("SORT_REGULAR", 0),
        ("SORT_NUMERIC", 1),
        ("SORT_STRING", 2),
        ("SORT_FLAG_CASE", 8),
        ("COUNT_RECURSIVE", 1),
        ("JSON_HEX_TAG", 1),
        ("JSON_PRETTY_PRINT", 128),
        ("JSON_UNESCAPED_SLASHES", 64),
        ("JSON_UNESCAPED_UNICODE", 256),
        ("JSON_THROW_ON_ERROR", 4194304),
        ("ENT_QUOTES", 3),
        ("ENT_HTML5", 48),
        ("PREG_PATTERN_ORDER", 1),
        ("PREG_SET_ORDER", 2),
        ("PREG_SPLIT_NO_EMPTY", 1),
        ("FILE_APPEND", 8),
        ("FILE_IGNORE_NEW_LINES", 2),
        ("LOCK_EX", 2),
        ("ARRAY_FILTER_USE_KEY", 2),
        ("ARRAY_FILTER_USE_BOTH", 1),
        ("FILTER_VALIDATE_INT", 257),
        ("FILTER_VALIDATE_EMAIL", 274),
        ("FILTER_DEFAULT", 516),
    ];
    constants.extend(ints.iter().map(|(name, value)| (*name, Type::Int(Some(*value)))));
    constants
}

// =========================================================================
// Classes
// =========================================================================

/// `(modifiers + name, parameters, return type)`; modifiers are `static`
/// and `protected`
type MethodSpec = (&'static str, &'static str, &'static str);

struct ClassSpec {
    name: &'static str,
    kind: ClassKind,
    parent: Option<&'static str>,
    interfaces: &'static [&'static str],
    methods: &'static [MethodSpec],
    /// `(name, type)`; always protected
    properties: &'static [(&'static str, &'static str)],
    dynamic: bool,
}

const fn interface(
    name: &'static str,
    parents: &'static [&'static str],
    methods: &'static [MethodSpec],
) -> ClassSpec {
    ClassSpec {
        name,
        kind: ClassKind::Interface,
        parent: None,
        interfaces: parents,
        methods,
        properties: &[],
        dynamic: false,
    }
}

const fn class(
    name: &'static str,
    parent: Option<&'static str>,
    interfaces: &'static [&'static str],
    methods: &'static [MethodSpec],
) -> ClassSpec {
    ClassSpec {
        name,
        kind: ClassKind::Class,
        parent,
        interfaces,
        methods,
        properties: &[],
        dynamic: false,
    }
}

const ITERATOR_METHODS: &[MethodSpec] = &[
    ("current", "", "mixed"),
    ("key", "", "mixed"),
    ("next", "", "void"),
    ("rewind", "", "void"),
    ("valid", "", "bool"),
];

const THROWABLE_METHODS: &[MethodSpec] = &[
    ("getMessage", "", "string"),
    ("getCode", "", "mixed"),
    ("getFile", "", "string"),
    ("getLine", "", "int"),
    ("getTrace", "", "array"),
    ("getTraceAsString", "", "string"),
    ("getPrevious", "", "?Throwable"),
    ("__toString", "", "string"),
];

const EXCEPTION_METHODS: &[MethodSpec] = &[
    ("__construct", "string $message = \"\", int $code = 0, ?Throwable $previous = null", "void"),
    ("getMessage", "", "string"),
    ("getCode", "", "mixed"),
    ("getFile", "", "string"),
    ("getLine", "", "int"),
    ("getTrace", "", "array"),
    ("getTraceAsString", "", "string"),
    ("getPrevious", "", "?Throwable"),
    ("__toString", "", "string"),
];

const EXCEPTION_PROPERTIES: &[(&str, &str)] = &[
    ("message", "string"),
    ("code", "mixed"),
    ("file", "string"),
    ("line", "int"),
];

const ARRAY_ACCESS_METHODS: &[MethodSpec] = &[
    ("offsetExists", "mixed $offset", "bool"),
    ("offsetGet", "mixed $offset", "mixed"),
    ("offsetSet", "mixed $offset, mixed $value", "void"),
    ("offsetUnset", "mixed $offset", "void"),
];

const DATE_METHODS: &[MethodSpec] = &[
    ("__construct", "string $datetime = \"now\", ?DateTimeZone $timezone = null", "void"),
    ("format", "string $format", "string"),
    ("getTimestamp", "", "int"),
    ("setTimestamp", "int $timestamp", "static"),
    ("modify", "string $modifier", "static|false"),
    ("setTimezone", "DateTimeZone $timezone", "static"),
    ("getTimezone", "", "DateTimeZone|false"),
    ("static createFromFormat", "string $format, string $datetime, ?DateTimeZone $timezone = null", "static|false"),
];

fn exception(name: &'static str, parent: &'static str) -> ClassSpec {
    class(name, Some(parent), &[], &[])
}

fn classes() -> Vec<ClassSpec> {
    let mut classes = vec![
        ClassSpec {
            dynamic: true,
            ..class("stdClass", None, &[], &[])
        },
        interface("Traversable", &[], &[]),
        interface("Iterator", &["Traversable"], ITERATOR_METHODS),
        interface("IteratorAggregate", &["Traversable"], &[("getIterator", "", "Traversable")]),
        interface("ArrayAccess", &[], ARRAY_ACCESS_METHODS),
        interface("Countable", &[], &[("count", "", "int")]),
        interface("JsonSerializable", &[], &[("jsonSerialize", "", "mixed")]),
        interface("Stringable", &[], &[("__toString", "", "string")]),
        interface("Throwable", &["Stringable"], THROWABLE_METHODS),
        interface(
            "DateTimeInterface",
            &[],
            &[("format", "string $format", "string"), ("getTimestamp", "", "int")],
        ),
        ClassSpec {
            properties: EXCEPTION_PROPERTIES,
            ..class("Exception", None, &["Throwable"], EXCEPTION_METHODS)
        },
        ClassSpec {
            properties: EXCEPTION_PROPERTIES,
            ..class("Error", None, &["Throwable"], EXCEPTION_METHODS)
        },
        class(
            "ErrorException",
            Some("Exception"),
            &[],
            &[
                ("__construct", "string $message = \"\", int $code = 0, int $severity = 1, ?string $filename = null, ?int $line = null, ?Throwable $previous = null", "void"),
                ("getSeverity", "", "int"),
            ],
        ),
        class(
            "Closure",
            None,
            &[],
            &[
                ("static bind", "Closure $closure, ?object $newThis, object|string|null $newScope = \"static\"", "?Closure"),
                ("bindTo", "?object $newThis, object|string|null $newScope = \"static\"", "?Closure"),
                ("call", "object $newThis, mixed ...$args", "mixed"),
                ("static fromCallable", "callable $callback", "Closure"),
                ("__invoke", "mixed ...$args", "mixed"),
            ],
        ),
        class(
            "Generator",
            None,
            &["Iterator"],
            &[
                ("current", "", "mixed"),
                ("key", "", "mixed"),
                ("next", "", "void"),
                ("rewind", "", "void"),
                ("valid", "", "bool"),
                ("send", "mixed $value", "mixed"),
                ("getReturn", "", "mixed"),
            ],
        ),
        class(
            "ArrayIterator",
            None,
            &["Iterator", "ArrayAccess", "Countable"],
            &[
                ("__construct", "array|object $array = [], int $flags = 0", "void"),
                ("getArrayCopy", "", "array"),
                ("count", "", "int"),
            ],
        ),
        class(
            "ArrayObject",
            None,
            &["IteratorAggregate", "ArrayAccess", "Countable"],
            &[
                ("__construct", "array|object $array = [], int $flags = 0, string $iteratorClass = \"ArrayIterator\"", "void"),
                ("getArrayCopy", "", "array"),
                ("getIterator", "", "Iterator"),
                ("count", "", "int"),
            ],
        ),
        class(
            "DateTimeZone",
            None,
            &[],
            &[("__construct", "string $timezone", "void"), ("getName", "", "string")],
        ),
        class("DateTime", None, &["DateTimeInterface"], DATE_METHODS),
        class("DateTimeImmutable", None, &["DateTimeInterface"], DATE_METHODS),
    ];
    classes.extend([
        exception("LogicException", "Exception"),
        exception("RuntimeException", "Exception"),
        exception("JsonException", "Exception"),
        exception("InvalidArgumentException", "LogicException"),
        exception("DomainException", "LogicException"),
        exception("LengthException", "LogicException"),
        exception("OutOfRangeException", "LogicException"),
        exception("BadFunctionCallException", "LogicException"),
        exception("BadMethodCallException", "BadFunctionCallException"),
        exception("OutOfBoundsException", "RuntimeException"),
        exception("RangeException", "RuntimeException"),
        exception("OverflowException", "RuntimeException"),
        exception("UnderflowException", "RuntimeException"),
        exception("UnexpectedValueException", "RuntimeException"),
        exception("TypeError", "Error"),
        exception("ValueError", "Error"),
        exception("ArithmeticError", "Error"),
        exception("DivisionByZeroError", "ArithmeticError"),
        exception("ArgumentCountError", "TypeError"),
    ]);
    classes
}

// =========================================================================
// Table construction
// =========================================================================

/// Split a parameter list on top-level commas, ignoring quoted defaults
fn split_params(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Parse `[type] [&][...]$name [= default]`
fn parse_param(text: &str, resolver: &TypeResolver<'_>) -> Option<Argument> {
    let (decl, default) = match text.split_once('=') {
        Some((decl, _)) => (decl.trim(), true),
        None => (text.trim(), false),
    };
    let dollar = decl.find('$')?;
    let name = decl[dollar + 1..].trim().to_string();
    let mut prefix = decl[..dollar].trim_end();
    let variadic = prefix.ends_with("...");
    prefix = prefix.trim_end_matches("...").trim_end();
    let by_ref = prefix.ends_with('&');
    prefix = prefix.trim_end_matches('&').trim_end();

    let ty = if prefix.is_empty() {
        None
    } else {
        resolver.resolve_text(prefix)
    };
    Some(Argument {
        name,
        ty,
        by_ref,
        has_default: default,
        variadic,
    })
}

/// `callable` and `?callable` parameters
fn takes_callback(ty: &Type) -> bool {
    match ty {
        Type::Function(_) => true,
        Type::Optional { content, .. } => takes_callback(content),
        _ => false,
    }
}

fn signature(name: &str, params: &str, ret: &str, resolver: &TypeResolver<'_>) -> FunctionType {
    let args: Vec<Argument> = split_params(params)
        .into_iter()
        .filter_map(|p| parse_param(p, resolver))
        .collect();
    let callback_positions = args
        .iter()
        .enumerate()
        .filter(|(_, a)| a.ty.as_ref().is_some_and(|t| t.members().iter().any(takes_callback)))
        .map(|(i, _)| i)
        .collect();
    let return_type = resolver.resolve_text(ret).unwrap_or_else(TypeUnion::mixed);
    FunctionType {
        declared_return: true,
        callback_positions,
        ..FunctionType::new(name, args, return_type)
    }
}

fn build_class(spec: &ClassSpec, names: &NameResolver) -> ClassEntry {
    let context = ClassContext {
        name: spec.name.to_string(),
        parent: spec.parent.map(str::to_string),
        is_trait: false,
    };
    let resolver = TypeResolver::new(names, Some(&context));
    let mut entry = ClassEntry::new(spec.name, spec.kind).with_interfaces(spec.interfaces.iter().copied());
    if let Some(parent) = spec.parent {
        entry = entry.with_parent(parent);
    }
    entry.dynamic_properties = spec.dynamic;
    entry.is_abstract = spec.kind == ClassKind::Interface;

    for (decl, params, ret) in spec.methods {
        let mut words: Vec<&str> = decl.split_whitespace().collect();
        let Some(name) = words.pop() else {
            continue;
        };
        let is_static = words.contains(&"static");
        let visibility = if words.contains(&"protected") {
            Visibility::Protected
        } else {
            Visibility::Public
        };
        let function = signature(name, params, ret, &resolver);
        entry.add_method(function, visibility, is_static);
    }
    for (name, ty) in spec.properties {
        let ty = resolver.resolve_text(ty).unwrap_or_else(TypeUnion::mixed);
        let mut member = Member::new(*name, ty.clone(), Visibility::Protected, spec.name);
        member.declared = Some(ty);
        entry.add_member(MemberKind::InstanceProperty, member);
    }
    entry
}

fn build() -> Registry {
    let names = NameResolver::new();
    let resolver = TypeResolver::new(&names, None);
    let mut registry = Registry::new();

    let tables = [
        STRING_FUNCTIONS,
        REGEX_FUNCTIONS,
        ARRAY_FUNCTIONS,
        MATH_FUNCTIONS,
        TYPE_FUNCTIONS,
        OUTPUT_FUNCTIONS,
        FILE_FUNCTIONS,
        TIME_FUNCTIONS,
    ];
    for table in tables {
        for (name, params, ret) in table {
            registry.add_function(name, signature(name, params, ret, &resolver));
        }
    }
    for (name, ty) in constants() {
        registry.add_constant(name, TypeUnion::of(ty));
    }
    for spec in classes() {
        registry.add_class(build_class(&spec, &names));
    }
    registry
}

static BUILTINS: Lazy<Registry> = Lazy::new(build);

/// A fresh registry seeded with every built-in symbol
pub fn registry() -> Registry {
    BUILTINS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lattice::{Hierarchy, Sentinel};
    use crate::analyze::registry::Lookup;

    #[test]
    fn test_split_params_respects_quotes() {
        assert_eq!(
            split_params("float $num, ?string $a = \",\", ?string $b = \".\""),
            vec!["float $num", "?string $a = \",\"", "?string $b = \".\""]
        );
        assert!(split_params("").is_empty());
    }

    #[test]
    fn test_strpos_signature() {
        let registry = registry();
        let strpos = registry.function("strpos").unwrap();
        assert_eq!(strpos.required_count(), 2);
        assert_eq!(strpos.max_count(), Some(3));
        assert_eq!(
            strpos.return_type,
            TypeUnion::of(Type::optional(Type::int(), Sentinel::False))
        );
    }

    #[test]
    fn test_by_ref_and_callbacks() {
        let registry = registry();
        let preg_match = registry.function("preg_match").unwrap();
        assert_eq!(preg_match.by_ref_positions(), vec![2]);
        assert_eq!(preg_match.required_count(), 2);

        let array_map = registry.function("array_map").unwrap();
        assert_eq!(array_map.callback_positions, vec![0]);
        assert_eq!(array_map.max_count(), None);

        let array_filter = registry.function("array_filter").unwrap();
        assert_eq!(array_filter.callback_positions, vec![1]);
        let usort = registry.function("usort").unwrap();
        assert_eq!(usort.callback_positions, vec![1]);
    }

    #[test]
    fn test_constants() {
        let registry = registry();
        assert_eq!(
            registry.constant("PHP_EOL"),
            Some(&TypeUnion::of(Type::string_value("\n")))
        );
        assert!(registry.constant("E_ALL").is_some());
        assert!(registry.constant("NOT_A_CONSTANT").is_none());
    }

    #[test]
    fn test_exception_hierarchy() {
        let registry = registry();
        assert!(registry.is_subclass_of("InvalidArgumentException", "Exception"));
        assert!(registry.is_subclass_of("DivisionByZeroError", "Throwable"));
        assert!(registry.is_stringable("RuntimeException"));
        match registry.find_member(
            "InvalidArgumentException",
            MemberKind::InstanceMethod,
            "getMessage",
            None,
        ) {
            Lookup::Found(resolved) => assert_eq!(resolved.declaring_class, "Exception"),
            other => panic!("expected getMessage, got {:?}", other),
        }
        assert!(matches!(
            registry.find_member("Exception", MemberKind::InstanceProperty, "message", None),
            Lookup::Inaccessible(_)
        ));
    }

    #[test]
    fn test_std_class_is_dynamic() {
        let registry = registry();
        assert!(matches!(
            registry.find_member("stdClass", MemberKind::InstanceProperty, "anything", None),
            Lookup::Found(_)
        ));
    }

    #[test]
    fn test_static_return_resolves_to_class() {
        let registry = registry();
        let member = registry.class("DateTime").unwrap().own_method("modify").unwrap();
        assert_eq!(
            member.function().unwrap().return_type,
            TypeUnion::of(Type::optional(Type::instance("DateTime"), Sentinel::False))
        );
    }
}
