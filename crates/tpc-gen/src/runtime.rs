//! The textual C++ runtime pasted at the top of every translation unit.
//!
//! The prologue is self-contained C++17: a file-handle wrapper, the
//! bounded-string class template, Pascal-flavoured write/read helpers,
//! the string/maths surface, and the `pascal_argc`/`pascal_argv`
//! globals the entry function fills in. It must compile with a stock
//! toolchain and link with no extra libraries.
//!
//! CRT colour constants are emitted separately (only when the program
//! uses CRT) so they cannot collide with user identifiers.

/// Standard-library includes of the generated unit.
pub const INCLUDES: &str = "\
#include <algorithm>
#include <array>
#include <cctype>
#include <chrono>
#include <cmath>
#include <cstdio>
#include <cstdlib>
#include <cstring>
#include <ctime>
#include <fstream>
#include <functional>
#include <iomanip>
#include <iostream>
#include <limits>
#include <set>
#include <sstream>
#include <string>
#include <thread>
";

/// The runtime prologue proper.
pub const RUNTIME_PRELUDE: &str = r#"
// ---- program environment ---------------------------------------------

static int pascal_argc = 0;
static char** pascal_argv = nullptr;
static int pascal_ioresult = 0;

static inline int pascal_ioresult_take() {
    int r = pascal_ioresult;
    pascal_ioresult = 0;
    return r;
}

constexpr int maxint = 32767;
constexpr double pi = 3.14159265358979323846;

// ---- strings ----------------------------------------------------------

static inline std::string pascal_str(const std::string& s) { return s; }
static inline std::string pascal_str(const char* s) { return std::string(s); }
static inline std::string pascal_str(char c) { return std::string(1, c); }

template <unsigned N>
class PascalString {
public:
    PascalString() = default;
    PascalString(const std::string& s) : data_(s.substr(0, N)) {}
    PascalString(const char* s) : data_(std::string(s).substr(0, N)) {}
    PascalString(char c) : data_(1, c) {}
    PascalString& operator=(const std::string& s) {
        data_ = s.substr(0, N);
        return *this;
    }
    operator std::string() const { return data_; }
    char& operator[](int i) { return data_[(size_t)i]; }
    char operator[](int i) const { return data_[(size_t)i]; }
    int length() const { return (int)data_.size(); }
    const std::string& str() const { return data_; }
    bool operator==(const PascalString& other) const { return data_ == other.data_; }
    bool operator!=(const PascalString& other) const { return data_ != other.data_; }
private:
    std::string data_;
};

template <unsigned N>
static inline std::string pascal_str(const PascalString<N>& s) { return s.str(); }

template <unsigned N>
static inline std::ostream& operator<<(std::ostream& os, const PascalString<N>& s) {
    return os << s.str();
}

static inline int pascal_length(const std::string& s) { return (int)s.size(); }
template <unsigned N>
static inline int pascal_length(const PascalString<N>& s) { return s.length(); }

static inline int pascal_pos(const std::string& sub, const std::string& s) {
    std::string::size_type p = s.find(sub);
    return p == std::string::npos ? 0 : (int)p + 1;
}

static inline std::string pascal_copy(const std::string& s, int index, int count) {
    if (count <= 0 || index > (int)s.size()) return std::string();
    if (index < 1) index = 1;
    return s.substr((size_t)index - 1, (size_t)count);
}

static inline void pascal_insert(const std::string& src, std::string& s, int index) {
    if (index < 1) index = 1;
    if (index > (int)s.size() + 1) index = (int)s.size() + 1;
    s.insert((size_t)index - 1, src);
}

static inline void pascal_delete(std::string& s, int index, int count) {
    if (index < 1 || index > (int)s.size() || count <= 0) return;
    s.erase((size_t)index - 1, (size_t)count);
}

static inline std::string pascal_trim(const std::string& s) {
    size_t b = s.find_first_not_of(" \t\r\n");
    if (b == std::string::npos) return std::string();
    size_t e = s.find_last_not_of(" \t\r\n");
    return s.substr(b, e - b + 1);
}

static inline std::string pascal_uppercase(std::string s) {
    for (char& c : s) c = (char)std::toupper((unsigned char)c);
    return s;
}

static inline std::string pascal_lowercase(std::string s) {
    for (char& c : s) c = (char)std::tolower((unsigned char)c);
    return s;
}

static inline std::string pascal_stringofchar(char c, int n) {
    return n > 0 ? std::string((size_t)n, c) : std::string();
}

static inline std::string pascal_leftstr(const std::string& s, int n) {
    if (n <= 0) return std::string();
    return s.substr(0, (size_t)n);
}

static inline std::string pascal_rightstr(const std::string& s, int n) {
    if (n <= 0) return std::string();
    if (n >= (int)s.size()) return s;
    return s.substr(s.size() - (size_t)n);
}

static inline std::string pascal_padleft(const std::string& s, int width) {
    if ((int)s.size() >= width) return s;
    return std::string((size_t)width - s.size(), ' ') + s;
}

static inline std::string pascal_padright(const std::string& s, int width) {
    if ((int)s.size() >= width) return s;
    return s + std::string((size_t)width - s.size(), ' ');
}

static inline char pascal_upcase(char c) {
    return (char)std::toupper((unsigned char)c);
}

static inline std::string pascal_inttostr(long long v) { return std::to_string(v); }

static inline std::string pascal_floattostr(double v) {
    std::ostringstream os;
    os << v;
    return os.str();
}

static inline int pascal_strtoint(const std::string& s) {
    try {
        return std::stoi(s);
    } catch (...) {
        return 0;
    }
}

static inline double pascal_strtofloat(const std::string& s) {
    try {
        return std::stod(s);
    } catch (...) {
        return 0.0;
    }
}

static inline void pascal_val(const std::string& s, int& v, int& code) {
    std::istringstream is(s);
    is >> v;
    code = (is.fail() || !is.eof()) ? 1 : 0;
    if (code != 0) v = 0;
}

static inline void pascal_val(const std::string& s, double& v, int& code) {
    std::istringstream is(s);
    is >> v;
    code = (is.fail() || !is.eof()) ? 1 : 0;
    if (code != 0) v = 0.0;
}

static inline void pascal_str_proc(int v, std::string& s) { s = std::to_string(v); }
static inline void pascal_str_proc(double v, std::string& s) { s = pascal_floattostr(v); }
template <class T, unsigned N>
static inline void pascal_str_proc(T v, PascalString<N>& s) {
    std::string out;
    pascal_str_proc(v, out);
    s = out;
}

// ---- set algebra ------------------------------------------------------

template <class T, class U>
static inline std::set<T> pascal_set_union(std::set<T> a, const std::set<U>& b) {
    for (const auto& x : b) a.insert(T(x));
    return a;
}

template <class T, class U>
static inline std::set<T> pascal_set_intersect(const std::set<T>& a, const std::set<U>& b) {
    std::set<T> r;
    for (const auto& x : a)
        if (b.count(U(x)) != 0) r.insert(x);
    return r;
}

template <class T, class U>
static inline std::set<T> pascal_set_diff(std::set<T> a, const std::set<U>& b) {
    for (const auto& x : b) a.erase(T(x));
    return a;
}

// ---- console I/O ------------------------------------------------------

template <class T>
static inline void pascal_write(const T& v) { std::cout << v; }
static inline void pascal_write(bool b) { std::cout << (b ? "TRUE" : "FALSE"); }
template <class T>
static inline void pascal_write(const T& v, int w) { std::cout << std::setw(w) << v; }
template <class T>
static inline void pascal_write(const T& v, int w, int p) {
    std::cout << std::fixed << std::setprecision(p) << std::setw(w) << v;
}
static inline void pascal_newline() { std::cout << "\n"; }

template <class T>
static inline void pascal_read(T& v) { std::cin >> v; }
static inline void pascal_read(std::string& s) { std::getline(std::cin, s); }
static inline void pascal_read(char& c) { c = (char)std::cin.get(); }
template <unsigned N>
static inline void pascal_read(PascalString<N>& s) {
    std::string line;
    std::getline(std::cin, line);
    s = line;
}

static inline void pascal_readln_flush() {
    std::cin.ignore(std::numeric_limits<std::streamsize>::max(), '\n');
}

static inline bool pascal_eof_stdin() { return std::cin.peek() == EOF; }

// ---- files ------------------------------------------------------------

class PascalFile {
public:
    void assign(const std::string& name) { name_ = name; }

    void reset() { open(std::ios::in); }
    void rewrite() { open(std::ios::out | std::ios::trunc); }
    void append() { open(std::ios::out | std::ios::app); }

    void close() {
        if (stream_.is_open()) stream_.close();
        pascal_ioresult = 0;
    }

    bool eof() {
        if (!stream_.is_open()) return true;
        return stream_.peek() == EOF;
    }

    template <class T>
    void write(const T& v) {
        stream_ << v;
        report();
    }
    void write(bool b) {
        stream_ << (b ? "TRUE" : "FALSE");
        report();
    }

    template <class T>
    void read(T& v) {
        stream_ >> v;
        report();
    }
    void read(std::string& s) {
        std::getline(stream_, s);
        report();
    }
    void read(char& c) {
        c = (char)stream_.get();
        report();
    }

    void skip_line() {
        stream_.ignore(std::numeric_limits<std::streamsize>::max(), '\n');
        stream_.clear();
    }

    template <class T>
    void blockread(T& buf, int count) {
        stream_.read(reinterpret_cast<char*>(&buf), (std::streamsize)count);
        report();
    }
    template <class T>
    void blockread(T& buf, int count, int& got) {
        stream_.read(reinterpret_cast<char*>(&buf), (std::streamsize)count);
        got = (int)stream_.gcount();
        stream_.clear();
    }
    template <class T>
    void blockwrite(const T& buf, int count) {
        stream_.write(reinterpret_cast<const char*>(&buf), (std::streamsize)count);
        report();
    }
    template <class T>
    void blockwrite(const T& buf, int count, int& put) {
        blockwrite(buf, count);
        put = stream_.good() ? count : 0;
    }

    int filepos() { return (int)stream_.tellg(); }

    int filesize() {
        std::streampos here = stream_.tellg();
        stream_.seekg(0, std::ios::end);
        std::streampos end = stream_.tellg();
        stream_.seekg(here);
        return (int)end;
    }

    void seek(int pos) {
        stream_.clear();
        stream_.seekg(pos);
        stream_.seekp(pos);
        report();
    }

private:
    void open(std::ios::openmode mode) {
        if (stream_.is_open()) stream_.close();
        stream_.clear();
        stream_.open(name_, mode);
        pascal_ioresult = stream_.is_open() ? 0 : 2;
    }

    void report() {
        if (stream_.fail() && !stream_.eof()) pascal_ioresult = 104;
    }

    std::string name_;
    std::fstream stream_;
};

// ---- maths and environment -------------------------------------------

template <class T>
static inline T pascal_sqr(T x) { return x * x; }

static inline int pascal_round(double x) { return (int)std::llround(x); }

static inline double pascal_random() {
    return (double)std::rand() / ((double)RAND_MAX + 1.0);
}
static inline int pascal_random(int n) { return n > 0 ? std::rand() % n : 0; }
static inline void pascal_randomize() { std::srand((unsigned)std::time(nullptr)); }

static inline int pascal_paramcount() {
    return pascal_argc > 0 ? pascal_argc - 1 : 0;
}
static inline std::string pascal_paramstr(int i) {
    if (i >= 0 && i < pascal_argc) return std::string(pascal_argv[i]);
    return std::string();
}

// ---- CRT shims --------------------------------------------------------

static inline void pascal_clrscr() { std::cout << "\033[2J\033[H"; }
static inline void pascal_clreol() { std::cout << "\033[K"; }
static inline void pascal_gotoxy(int x, int y) {
    std::cout << "\033[" << y << ";" << x << "H";
}
static inline int pascal_wherex() { return 1; }
static inline int pascal_wherey() { return 1; }

static inline void pascal_textcolor(int c) {
    static const int fg[8] = {30, 34, 32, 36, 31, 35, 33, 37};
    std::cout << "\033[" << ((c & 8) ? 1 : 22) << ";" << fg[c & 7] << "m";
}
static inline void pascal_textbackground(int c) {
    static const int bg[8] = {40, 44, 42, 46, 41, 45, 43, 47};
    std::cout << "\033[" << bg[c & 7] << "m";
}
static inline void pascal_highvideo() { std::cout << "\033[1m"; }
static inline void pascal_lowvideo() { std::cout << "\033[2m"; }
static inline void pascal_normvideo() { std::cout << "\033[0m"; }

static inline void pascal_delay(int ms) {
    std::this_thread::sleep_for(std::chrono::milliseconds(ms));
}
static inline bool pascal_keypressed() { return false; }
static inline char pascal_readkey() { return (char)std::getchar(); }
static inline void pascal_sound(int) {}
static inline void pascal_nosound() {}

// ---- DOS shims --------------------------------------------------------

static inline void pascal_getdate(int& year, int& month, int& day, int& dow) {
    std::time_t t = std::time(nullptr);
    std::tm* lt = std::localtime(&t);
    year = lt->tm_year + 1900;
    month = lt->tm_mon + 1;
    day = lt->tm_mday;
    dow = lt->tm_wday;
}

static inline void pascal_gettime(int& hour, int& minute, int& second, int& sec100) {
    std::time_t t = std::time(nullptr);
    std::tm* lt = std::localtime(&t);
    hour = lt->tm_hour;
    minute = lt->tm_min;
    second = lt->tm_sec;
    sec100 = 0;
}
"#;

/// CRT colour constants, emitted only when the program uses CRT so the
/// names cannot collide with user identifiers.
pub const CRT_COLORS: &str = "\
constexpr int black = 0;
constexpr int blue = 1;
constexpr int green = 2;
constexpr int cyan = 3;
constexpr int red = 4;
constexpr int magenta = 5;
constexpr int brown = 6;
constexpr int lightgray = 7;
constexpr int darkgray = 8;
constexpr int lightblue = 9;
constexpr int lightgreen = 10;
constexpr int lightcyan = 11;
constexpr int lightred = 12;
constexpr int lightmagenta = 13;
constexpr int yellow = 14;
constexpr int white = 15;
constexpr int blink = 128;
";
