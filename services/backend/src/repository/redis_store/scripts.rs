//! Redis Lua scripts for atomic wallet operations
//!
//! Every balance mutation commits together with its paired ledger write in
//! a single script invocation, so concurrent operations against the same
//! account can never interleave between the balance read and the balance
//! write. Scripts return an array whose first element is 'OK' or 'ERR';
//! error replies carry a code and, where useful, the current balance.

/// Atomically create an account if it does not exist yet.
///
/// Keys: [account_key, email_index_key, accounts_index]
/// Args: [account_id, email, first_name, last_name, currency, now_ms]
///
/// Returns: 1 if created, 0 if the account already existed
pub const CREATE_ACCOUNT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end

redis.call('HSET', KEYS[1],
  'account_id', ARGV[1],
  'email', ARGV[2],
  'first_name', ARGV[3],
  'last_name', ARGV[4],
  'balance', '0',
  'currency', ARGV[5],
  'status', 'active',
  'total_deposited', '0',
  'total_withdrawn', '0',
  'total_wagered', '0',
  'total_won', '0',
  'created_at_ms', ARGV[6]
)
if ARGV[2] ~= '' then
  redis.call('SET', KEYS[2], ARGV[1])
end
redis.call('ZADD', KEYS[3], tonumber(ARGV[6]), ARGV[1])
return 1
"#;

/// Atomically place a bet: balance check + debit + bet record + ledger entry.
///
/// Keys: [account_key, bet_key, account_bets_index, tx_key,
///        account_txs_index, txs_all_index, refs_set]
/// Args: [amount, strict_flag, bet_id, tx_id, reference, game_id, game_type,
///        details_json, description, metadata_json, now_ms, account_id]
///
/// The debit is capped at the available balance when strict_flag is '0';
/// the ledger entry records the amount actually debited.
///
/// Returns: ['OK', new_balance, debited] or ['ERR', code, ...]
pub const PLACE_BET_SCRIPT: &str = r#"
local status = redis.call('HGET', KEYS[1], 'status')
if not status then
  return {'ERR', 'account_missing'}
end
if status ~= 'active' then
  return {'ERR', 'account_inactive', status}
end
if redis.call('SISMEMBER', KEYS[7], ARGV[5]) == 1 then
  return {'ERR', 'duplicate_reference'}
end

local amount = tonumber(ARGV[1])
local balance = tonumber(redis.call('HGET', KEYS[1], 'balance') or '0')
local debited = amount
if balance < amount then
  if ARGV[2] == '1' then
    return {'ERR', 'insufficient_funds', tostring(balance)}
  end
  debited = balance
end

local new_balance = balance - debited
redis.call('HSET', KEYS[1], 'balance', tostring(new_balance))
redis.call('HINCRBY', KEYS[1], 'total_wagered', amount)
local currency = redis.call('HGET', KEYS[1], 'currency')

redis.call('HSET', KEYS[2],
  'bet_id', ARGV[3],
  'account_id', ARGV[12],
  'game_id', ARGV[6],
  'game_type', ARGV[7],
  'amount', ARGV[1],
  'debited', tostring(debited),
  'status', 'pending',
  'payout', '0',
  'details', ARGV[8],
  'created_at_ms', ARGV[11],
  'settled_at_ms', ''
)
redis.call('ZADD', KEYS[3], tonumber(ARGV[11]), ARGV[3])

redis.call('HSET', KEYS[4],
  'transaction_id', ARGV[4],
  'account_id', ARGV[12],
  'tx_type', 'bet',
  'amount', tostring(-debited),
  'currency', currency,
  'status', 'completed',
  'description', ARGV[9],
  'reference', ARGV[5],
  'game_id', ARGV[6],
  'game_type', ARGV[7],
  'bet_id', ARGV[3],
  'metadata', ARGV[10],
  'created_at_ms', ARGV[11],
  'completed_at_ms', ARGV[11]
)
redis.call('SADD', KEYS[7], ARGV[5])
redis.call('ZADD', KEYS[5], tonumber(ARGV[11]), ARGV[4])
redis.call('ZADD', KEYS[6], tonumber(ARGV[11]), ARGV[4])

return {'OK', tostring(new_balance), tostring(debited)}
"#;

/// Atomically settle a pending bet.
///
/// Keys: [bet_key, account_key, tx_key, account_txs_index, txs_all_index,
///        refs_set]
/// Args: [account_id, outcome, payout, tx_id, reference, description,
///        metadata_json, now_ms]
///
/// A 'won' outcome credits the payout and books a win entry; 'cancelled'
/// refunds the recorded debit; 'lost' touches nothing but the bet. The
/// status transition is the double-settlement guard: only a pending bet
/// passes.
///
/// Returns: ['OK', new_balance, credit] or ['ERR', code, ...]
pub const SETTLE_BET_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return {'ERR', 'bet_missing'}
end
local owner = redis.call('HGET', KEYS[1], 'account_id')
if owner ~= ARGV[1] then
  return {'ERR', 'bet_missing'}
end
local bstatus = redis.call('HGET', KEYS[1], 'status')
if bstatus ~= 'pending' then
  return {'ERR', 'already_settled', bstatus}
end
if redis.call('EXISTS', KEYS[2]) == 0 then
  return {'ERR', 'account_missing'}
end

local outcome = ARGV[2]
local credit = 0
local entry_type = 'win'
if outcome == 'won' then
  credit = tonumber(ARGV[3])
elseif outcome == 'cancelled' then
  credit = tonumber(redis.call('HGET', KEYS[1], 'debited') or '0')
  entry_type = 'refund'
end

if credit > 0 and redis.call('SISMEMBER', KEYS[6], ARGV[5]) == 1 then
  return {'ERR', 'duplicate_reference'}
end

local payout = '0'
if outcome == 'won' then
  payout = ARGV[3]
end
redis.call('HSET', KEYS[1],
  'status', outcome,
  'payout', payout,
  'settled_at_ms', ARGV[8]
)

local balance = tonumber(redis.call('HGET', KEYS[2], 'balance') or '0')
local new_balance = balance
if credit > 0 then
  new_balance = balance + credit
  redis.call('HSET', KEYS[2], 'balance', tostring(new_balance))
  if outcome == 'won' then
    redis.call('HINCRBY', KEYS[2], 'total_won', credit)
  end
  local currency = redis.call('HGET', KEYS[2], 'currency')
  redis.call('HSET', KEYS[3],
    'transaction_id', ARGV[4],
    'account_id', ARGV[1],
    'tx_type', entry_type,
    'amount', tostring(credit),
    'currency', currency,
    'status', 'completed',
    'description', ARGV[6],
    'reference', ARGV[5],
    'game_id', redis.call('HGET', KEYS[1], 'game_id'),
    'game_type', redis.call('HGET', KEYS[1], 'game_type'),
    'bet_id', redis.call('HGET', KEYS[1], 'bet_id'),
    'metadata', ARGV[7],
    'created_at_ms', ARGV[8],
    'completed_at_ms', ARGV[8]
  )
  redis.call('SADD', KEYS[6], ARGV[5])
  redis.call('ZADD', KEYS[4], tonumber(ARGV[8]), ARGV[4])
  redis.call('ZADD', KEYS[5], tonumber(ARGV[8]), ARGV[4])
end

return {'OK', tostring(new_balance), tostring(credit)}
"#;

/// Atomically apply a ledger entry with its balance effect.
///
/// Keys: [account_key, tx_key, account_txs_index, txs_all_index,
///        pending_index, refs_set]
/// Args: [account_id, tx_type, amount, mode, aggregate, description,
///        reference, metadata_json, tx_id, now_ms, game_id, game_type,
///        bet_id]
///
/// Modes: 'hold' writes a pending entry without touching the balance;
/// 'credit' / 'debit_strict' / 'debit_capped' settle immediately. A capped
/// debit floors the balance at zero and the entry records the delta
/// actually applied.
///
/// Returns: ['OK', new_balance, applied] or ['ERR', code, ...]
pub const APPLY_ENTRY_SCRIPT: &str = r#"
local status = redis.call('HGET', KEYS[1], 'status')
if not status then
  return {'ERR', 'account_missing'}
end
if status ~= 'active' then
  return {'ERR', 'account_inactive', status}
end
if redis.call('SISMEMBER', KEYS[6], ARGV[7]) == 1 then
  return {'ERR', 'duplicate_reference'}
end

local amount = tonumber(ARGV[3])
local mode = ARGV[4]
local balance = tonumber(redis.call('HGET', KEYS[1], 'balance') or '0')
local applied = amount
local entry_status = 'completed'
local completed_at = ARGV[10]
local new_balance = balance

if mode == 'hold' then
  entry_status = 'pending'
  completed_at = ''
else
  if amount < 0 then
    local need = -amount
    if balance < need then
      if mode == 'debit_strict' then
        return {'ERR', 'insufficient_funds', tostring(balance)}
      end
      applied = -balance
    end
  end
  new_balance = balance + applied
  redis.call('HSET', KEYS[1], 'balance', tostring(new_balance))
  local magnitude = applied
  if magnitude < 0 then
    magnitude = -magnitude
  end
  local aggregate = ARGV[5]
  if aggregate == 'deposited' then
    redis.call('HINCRBY', KEYS[1], 'total_deposited', magnitude)
  elseif aggregate == 'withdrawn' then
    redis.call('HINCRBY', KEYS[1], 'total_withdrawn', magnitude)
  elseif aggregate == 'wagered' then
    redis.call('HINCRBY', KEYS[1], 'total_wagered', magnitude)
  elseif aggregate == 'won' then
    redis.call('HINCRBY', KEYS[1], 'total_won', magnitude)
  end
end

local currency = redis.call('HGET', KEYS[1], 'currency')
redis.call('HSET', KEYS[2],
  'transaction_id', ARGV[9],
  'account_id', ARGV[1],
  'tx_type', ARGV[2],
  'amount', tostring(applied),
  'currency', currency,
  'status', entry_status,
  'description', ARGV[6],
  'reference', ARGV[7],
  'game_id', ARGV[11],
  'game_type', ARGV[12],
  'bet_id', ARGV[13],
  'metadata', ARGV[8],
  'created_at_ms', ARGV[10],
  'completed_at_ms', completed_at
)
redis.call('SADD', KEYS[6], ARGV[7])
redis.call('ZADD', KEYS[3], tonumber(ARGV[10]), ARGV[9])
redis.call('ZADD', KEYS[4], tonumber(ARGV[10]), ARGV[9])
if entry_status == 'pending' then
  redis.call('ZADD', KEYS[5], tonumber(ARGV[10]), ARGV[9])
end

return {'OK', tostring(new_balance), tostring(applied)}
"#;

/// Atomically resolve a pending deposit or withdrawal.
///
/// Keys: [tx_key, account_key, pending_index]
/// Args: [expected_account_id, decision, now_ms]
///
/// The caller reads the entry first to learn its account; the script
/// re-verifies everything so a stale read cannot double-apply. An approved
/// withdrawal is re-checked against the balance as it is NOW; on
/// insufficient funds the entry is left pending for manual resolution.
///
/// Returns: ['OK', new_balance] or ['ERR', code, ...]
pub const RESOLVE_ENTRY_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return {'ERR', 'tx_missing'}
end
local tstatus = redis.call('HGET', KEYS[1], 'status')
if tstatus ~= 'pending' then
  return {'ERR', 'already_processed', tstatus}
end
local ttype = redis.call('HGET', KEYS[1], 'tx_type')
if ttype ~= 'deposit' and ttype ~= 'withdrawal' then
  return {'ERR', 'wrong_type', ttype}
end
local account_id = redis.call('HGET', KEYS[1], 'account_id')
if account_id ~= ARGV[1] then
  return {'ERR', 'stale_read'}
end
local tx_id = redis.call('HGET', KEYS[1], 'transaction_id')

if ARGV[2] == 'reject' then
  redis.call('HSET', KEYS[1], 'status', 'failed', 'completed_at_ms', ARGV[3])
  redis.call('ZREM', KEYS[3], tx_id)
  local balance = tonumber(redis.call('HGET', KEYS[2], 'balance') or '0')
  return {'OK', tostring(balance)}
end

if redis.call('EXISTS', KEYS[2]) == 0 then
  return {'ERR', 'account_missing'}
end
local amount = tonumber(redis.call('HGET', KEYS[1], 'amount'))
local balance = tonumber(redis.call('HGET', KEYS[2], 'balance') or '0')
if amount < 0 and balance < -amount then
  return {'ERR', 'insufficient_funds', tostring(balance)}
end

local new_balance = balance + amount
redis.call('HSET', KEYS[2], 'balance', tostring(new_balance))
local magnitude = amount
if magnitude < 0 then
  magnitude = -magnitude
end
if ttype == 'deposit' then
  redis.call('HINCRBY', KEYS[2], 'total_deposited', magnitude)
else
  redis.call('HINCRBY', KEYS[2], 'total_withdrawn', magnitude)
end
redis.call('HSET', KEYS[1], 'status', 'completed', 'completed_at_ms', ARGV[3])
redis.call('ZREM', KEYS[3], tx_id)
return {'OK', tostring(new_balance)}
"#;
