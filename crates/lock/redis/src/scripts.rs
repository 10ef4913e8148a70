/// Lua script for acquiring a lock (SET NX PX).
///
/// KEYS\[1\] = lock key
/// ARGV\[1\] = holder token
/// ARGV\[2\] = lease in milliseconds
///
/// Returns 1 if acquired, 0 if the key already existed.
pub const LOCK_ACQUIRE: &str = r"
local ok = redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2])
if ok then
    return 1
end
return 0
";

/// Lua script for releasing a lock via compare-and-delete.
///
/// KEYS\[1\] = lock key
/// ARGV\[1\] = holder token
///
/// Returns 1 if deleted, 0 if the key was absent or held by another token.
pub const LOCK_RELEASE: &str = r"
local holder = redis.call('GET', KEYS[1])
if holder == ARGV[1] then
    redis.call('DEL', KEYS[1])
    return 1
end
return 0
";

/// Lua script for extending a lock's lease.
///
/// KEYS\[1\] = lock key
/// ARGV\[1\] = holder token
/// ARGV\[2\] = new lease in milliseconds
///
/// Returns 1 if extended, 0 if the key was absent or held by another token.
pub const LOCK_EXTEND: &str = r"
local holder = redis.call('GET', KEYS[1])
if holder == ARGV[1] then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
    return 1
end
return 0
";
