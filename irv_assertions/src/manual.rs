/*!

This is the long-form manual for `irv_assertions` and `irvexplain`.

## Elimination orders and suffixes

An elimination order lists all the candidates in the order in which they are eliminated. The
last candidate is the winner. With 4 candidates Alice (0), Bob (1), Chuan (2) and Diego (3),
the order `[1, 3, 0, 2]` means that Bob is eliminated first, then Diego, then Alice, and that
Chuan wins.

A suffix is the end of an elimination order: `[0, 2]` stands for all the orders in which Alice
is the last one eliminated before Chuan wins. Most assertions can be decided on short suffixes,
which is why the explanations start from the one-candidate suffixes and only grow them when an
assertion needs more detail.

## Assertions

### `NEB`: not eliminated before

`Chuan NEB Bob` states that Chuan always has more votes than Bob, whichever other candidates are
still in the count. In every surviving elimination order, Chuan appears after Bob.

### `NEN`: not eliminated next

`NEN: Chuan > Alice if only {Alice,Chuan} remain` states that, when only Alice and Chuan are
still continuing, Chuan has more votes than Alice. An elimination order is ruled out if its last
candidates are exactly the continuing ones and the winner of the assertion is the first of them
to be eliminated. Orders in which this set of continuing candidates never happens are not
affected.

## Input formats

`irvexplain` reads a JSON file in one of the two following shapes.

### Explicit audit

```text
{
  "candidateNames": ["Alice", "Bob", "Chuan", "Diego"],
  "numCandidates": 4,
  "assertions": [
    {"type": "NEB", "winner": 2, "loser": 1},
    {"type": "NEN", "winner": 2, "loser": 0, "continuing": [0, 2]}
  ],
  "declaredWinner": 2
}
```

`numCandidates` is optional. Each assertion may carry an `index`. If not provided, the position of
the assertion in the list is used.

### Output of an assertion generator

The result of the audit assertion generator (such as RAIRE), with the candidate names in the
metadata:

```text
{
  "metadata": {"candidates": ["Alice", "Bob", "Chuan", "Diego"]},
  "solution": {"Ok": {
    "assertions": [
      {"assertion": {"type": "NEB", "winner": 2, "loser": 1}, "difficulty": 4.2, "margin": 100}
    ],
    "winner": 2,
    "num_candidates": 4
  }}
}
```

A solution of the form `{"Err": ...}` is reported as an error.

## Validation

Before any computation, the input is checked: all the candidates must be in range, the winner
and the loser of an assertion must differ, and a NEN assertion needs at least two continuing
candidates including its winner and its loser. Candidates are given by their index, starting
from 0: any other value is reported together with the position of its assertion. The assertions must then imply the declared
winner and rule out every other candidate. Otherwise the audit is reported as contradictory
(no elimination order survives), ambiguous (other candidates may still win) or mismatched (the
declared winner cannot win).

## Limits

Enumerating all the elimination orders is only possible for a small number of candidates (8 by
default: 40320 orders). Above this limit, the computations start from the one-candidate suffixes
and `--expand-fully` is refused. The lazy tree (`--lazy-depth`) is meant for the elections with
many candidates.
 */
